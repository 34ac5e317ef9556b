//! Verification methods and resolved public keys.
//!
//! Resolving a verification method (from a DID document or elsewhere) is the
//! caller's job; this module only models the result.
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::jwk::JWK;
use crate::multicodec;

pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";
pub const MULTIKEY: &str = "Multikey";
pub const ED25519_VERIFICATION_KEY_2020: &str = "Ed25519VerificationKey2020";
pub const ECDSA_SECP256R1_VERIFICATION_KEY_2019: &str = "EcdsaSecp256r1VerificationKey2019";

/// An identified public key bound to a controller.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<JWK>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

impl VerificationMethod {
    /// Builds a verification method from a JWK. Private parameters are
    /// stripped.
    pub fn from_jwk(
        id: impl Into<String>,
        type_: impl Into<String>,
        controller: impl Into<String>,
        jwk: &JWK,
    ) -> Self {
        Self {
            id: id.into(),
            type_: type_.into(),
            controller: controller.into(),
            public_key_jwk: Some(jwk.to_public()),
            public_key_multibase: None,
        }
    }

    /// Builds a verification method from raw public key bytes, stored as
    /// base58-btc multibase behind the `codec` multicodec prefix.
    pub fn from_bytes(
        id: impl Into<String>,
        type_: impl Into<String>,
        controller: impl Into<String>,
        codec: u64,
        public_key: &[u8],
    ) -> Self {
        let encoded = multicodec::encode(codec, public_key);
        Self {
            id: id.into(),
            type_: type_.into(),
            controller: controller.into(),
            public_key_jwk: None,
            public_key_multibase: Some(multibase::encode(multibase::Base::Base58Btc, encoded)),
        }
    }

    /// Public key material. A `publicKeyMultibase` value must carry a
    /// multicodec prefix naming the key type.
    pub fn public_key(&self) -> Result<PublicKey, Error> {
        let (value, decoded) = match &self.public_key_multibase {
            Some(encoded) => {
                let (_, bytes) = multibase::decode(encoded)?;
                let (codec, key) = multicodec::decode(&bytes)?;
                (Some(key.to_vec()), Some(jwk_from_codec(codec, key)?))
            }
            None => (None, None),
        };
        let jwk = self.public_key_jwk.clone().or(decoded);
        PublicKey::new(self.type_.clone(), value, jwk)
    }
}

/// Result of public key resolution.
///
/// At least one of `value` and `jwk` is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub type_: String,
    pub value: Option<Vec<u8>>,
    pub jwk: Option<JWK>,
}

impl PublicKey {
    pub fn new(type_: String, value: Option<Vec<u8>>, jwk: Option<JWK>) -> Result<Self, Error> {
        if value.is_none() && jwk.is_none() {
            return Err(Error::MissingPublicKey);
        }
        Ok(Self { type_, value, jwk })
    }

    pub fn from_jwk(type_: impl Into<String>, jwk: JWK) -> Self {
        Self {
            type_: type_.into(),
            value: None,
            jwk: Some(jwk),
        }
    }

    /// Structured form of the key. Raw bytes are interpreted according to
    /// the key type tag, or their length when the tag is generic.
    pub fn to_jwk(&self) -> Result<JWK, Error> {
        if let Some(jwk) = &self.jwk {
            return Ok(jwk.clone());
        }
        let bytes = self.value.as_deref().ok_or(Error::MissingPublicKey)?;
        let codec = match (self.type_.as_str(), bytes.len()) {
            (ED25519_VERIFICATION_KEY_2020 | "Ed25519VerificationKey2018" | "Ed25519", 32)
            | (MULTIKEY, 32) => multicodec::ED25519_PUB,
            (ECDSA_SECP256R1_VERIFICATION_KEY_2019 | "P-256" | MULTIKEY, 33 | 65) => {
                multicodec::P256_PUB
            }
            ("P-384" | MULTIKEY, 49 | 97) => multicodec::P384_PUB,
            (type_, _) => return Err(Error::UnsupportedKey(type_.to_string())),
        };
        jwk_from_codec(codec, bytes)
    }
}

#[allow(unused_variables)]
fn jwk_from_codec(codec: u64, bytes: &[u8]) -> Result<JWK, Error> {
    match codec {
        #[cfg(feature = "ed25519")]
        multicodec::ED25519_PUB => {
            if bytes.len() != 32 {
                return Err(Error::InvalidKeyLength);
            }
            Ok(okp_ed25519(bytes))
        }
        #[cfg(feature = "secp256r1")]
        multicodec::P256_PUB => {
            let pk = p256::PublicKey::from_sec1_bytes(bytes).map_err(Error::crypto)?;
            Ok(ec_jwk(crate::jwk::ECParams::from(&pk)))
        }
        #[cfg(feature = "secp384r1")]
        multicodec::P384_PUB => {
            let pk = p384::PublicKey::from_sec1_bytes(bytes).map_err(Error::crypto)?;
            Ok(ec_jwk(crate::jwk::ECParams::from(&pk)))
        }
        _ => Err(Error::UnexpectedCodec(codec)),
    }
}

#[cfg(feature = "ed25519")]
fn okp_ed25519(bytes: &[u8]) -> JWK {
    jwk_from_params(crate::jwk::Params::OKP(crate::jwk::OctetParams {
        curve: "Ed25519".to_string(),
        public_key: crate::jwk::Base64urlUInt(bytes.to_vec()),
        private_key: None,
    }))
}

#[cfg(any(feature = "secp256r1", feature = "secp384r1"))]
fn ec_jwk(params: crate::jwk::ECParams) -> JWK {
    jwk_from_params(crate::jwk::Params::EC(params))
}

#[allow(dead_code)]
fn jwk_from_params(params: crate::jwk::Params) -> JWK {
    JWK {
        public_key_use: None,
        key_operations: None,
        algorithm: None,
        key_id: None,
        params,
    }
}
