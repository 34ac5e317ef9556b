use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::Error;

// RFC 7517 - JSON Web Key (JWK)
// RFC 7518 - JSON Web Algorithms (JWA)
// RFC 8037 - CFRG Elliptic Curve Diffie-Hellman (ECDH) and Signatures in JOSE

pub(crate) const BASE64_URL: base64::engine::GeneralPurpose =
    base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Minimum RSA modulus size accepted for signing and verification.
pub const RSA_MIN_MODULUS_BITS: usize = 2048;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JWK {
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_use: Option<String>,

    #[serde(rename = "key_ops")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_operations: Option<Vec<String>>,

    #[serde(rename = "alg")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,

    #[serde(rename = "kid")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    #[serde(flatten)]
    pub params: Params,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kty")]
pub enum Params {
    EC(ECParams),
    RSA(RSAParams),
    OKP(OctetParams),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ECParams {
    // Parameters for Elliptic Curve Public Keys
    #[serde(rename = "crv")]
    pub curve: Option<String>,
    #[serde(rename = "x")]
    pub x_coordinate: Option<Base64urlUInt>,
    #[serde(rename = "y")]
    pub y_coordinate: Option<Base64urlUInt>,

    // Parameters for Elliptic Curve Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecc_private_key: Option<Base64urlUInt>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RSAParams {
    // Parameters for RSA Public Keys
    #[serde(rename = "n")]
    pub modulus: Option<Base64urlUInt>,
    #[serde(rename = "e")]
    pub exponent: Option<Base64urlUInt>,

    // Parameters for RSA Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_exponent: Option<Base64urlUInt>,
    #[serde(rename = "p")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_prime_factor: Option<Base64urlUInt>,
    #[serde(rename = "q")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_prime_factor: Option<Base64urlUInt>,
    #[serde(rename = "dp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_prime_factor_crt_exponent: Option<Base64urlUInt>,
    #[serde(rename = "dq")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_prime_factor_crt_exponent: Option<Base64urlUInt>,
    #[serde(rename = "qi")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_crt_coefficient: Option<Base64urlUInt>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OctetParams {
    // Parameters for Octet Key Pair Public Keys
    #[serde(rename = "crv")]
    pub curve: String,
    #[serde(rename = "x")]
    pub public_key: Base64urlUInt,

    // Parameters for Octet Key Pair Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<Base64urlUInt>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Zeroize)]
#[serde(try_from = "String")]
#[serde(into = "Base64urlUIntString")]
pub struct Base64urlUInt(pub Vec<u8>);
type Base64urlUIntString = String;

impl TryFrom<String> for Base64urlUInt {
    type Error = base64::DecodeError;
    fn try_from(data: String) -> Result<Self, Self::Error> {
        Ok(Base64urlUInt(BASE64_URL.decode(data)?))
    }
}

impl From<Base64urlUInt> for Base64urlUIntString {
    fn from(data: Base64urlUInt) -> Base64urlUIntString {
        BASE64_URL.encode(&data.0)
    }
}

impl Drop for ECParams {
    fn drop(&mut self) {
        self.ecc_private_key.zeroize();
    }
}

impl Drop for RSAParams {
    fn drop(&mut self) {
        self.private_exponent.zeroize();
        self.first_prime_factor.zeroize();
        self.second_prime_factor.zeroize();
        self.first_prime_factor_crt_exponent.zeroize();
        self.second_prime_factor_crt_exponent.zeroize();
        self.first_crt_coefficient.zeroize();
    }
}

impl Drop for OctetParams {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// JSON Web Algorithm identifiers supported for signing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    ES256,
    ES384,
    EdDSA,
    RS256,
    PS256,
    #[default]
    #[serde(alias = "None")]
    #[serde(rename = "none")]
    None,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::EdDSA => "EdDSA",
            Self::RS256 => "RS256",
            Self::PS256 => "PS256",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl JWK {
    fn from_params(params: Params) -> Self {
        Self {
            public_key_use: None,
            key_operations: None,
            algorithm: None,
            key_id: None,
            params,
        }
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    #[cfg(feature = "secp256r1")]
    pub fn generate_p256() -> Self {
        let secret_key = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let mut params = ECParams::from(&secret_key.public_key());
        params.ecc_private_key = Some(Base64urlUInt(secret_key.to_bytes().to_vec()));
        Self::from_params(Params::EC(params))
    }

    #[cfg(feature = "secp384r1")]
    pub fn generate_p384() -> Self {
        let secret_key = p384::SecretKey::random(&mut rand::rngs::OsRng);
        let mut params = ECParams::from(&secret_key.public_key());
        params.ecc_private_key = Some(Base64urlUInt(secret_key.to_bytes().to_vec()));
        Self::from_params(Params::EC(params))
    }

    #[cfg(feature = "ed25519")]
    pub fn generate_ed25519() -> Self {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_params(Params::OKP(OctetParams {
            curve: "Ed25519".to_string(),
            public_key: Base64urlUInt(signing_key.verifying_key().to_bytes().to_vec()),
            private_key: Some(Base64urlUInt(signing_key.to_bytes().to_vec())),
        }))
    }

    #[cfg(feature = "rsa")]
    pub fn generate_rsa(bits: usize) -> Result<Self, Error> {
        use rsa::traits::{PrivateKeyParts, PublicKeyParts};
        let key = rsa::RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)?;
        let uint = |n: &rsa::BigUint| Base64urlUInt(n.to_bytes_be());
        let primes = key.primes();
        Ok(Self::from_params(Params::RSA(RSAParams {
            modulus: Some(uint(key.n())),
            exponent: Some(uint(key.e())),
            private_exponent: Some(uint(key.d())),
            first_prime_factor: primes.first().map(uint),
            second_prime_factor: primes.get(1).map(uint),
            first_prime_factor_crt_exponent: key.dp().map(uint),
            second_prime_factor_crt_exponent: key.dq().map(uint),
            first_crt_coefficient: key.crt_coefficient().as_ref().map(uint),
        })))
    }

    /// Returns a copy of this key with every private parameter removed.
    pub fn to_public(&self) -> Self {
        let params = match &self.params {
            Params::EC(ec) => Params::EC(ECParams {
                curve: ec.curve.clone(),
                x_coordinate: ec.x_coordinate.clone(),
                y_coordinate: ec.y_coordinate.clone(),
                ecc_private_key: None,
            }),
            Params::RSA(rsa) => Params::RSA(RSAParams {
                modulus: rsa.modulus.clone(),
                exponent: rsa.exponent.clone(),
                private_exponent: None,
                first_prime_factor: None,
                second_prime_factor: None,
                first_prime_factor_crt_exponent: None,
                second_prime_factor_crt_exponent: None,
                first_crt_coefficient: None,
            }),
            Params::OKP(okp) => Params::OKP(OctetParams {
                curve: okp.curve.clone(),
                public_key: okp.public_key.clone(),
                private_key: None,
            }),
        };
        Self {
            params,
            ..self.clone()
        }
    }

    pub fn is_public(&self) -> bool {
        match &self.params {
            Params::EC(ec) => ec.ecc_private_key.is_none(),
            Params::RSA(rsa) => rsa.private_exponent.is_none(),
            Params::OKP(okp) => okp.private_key.is_none(),
        }
    }

    /// Default signing algorithm for this key: the explicit `alg` when
    /// present, otherwise the one implied by the key type and curve.
    pub fn get_algorithm(&self) -> Option<Algorithm> {
        if let Some(algorithm) = self.algorithm {
            return Some(algorithm);
        }
        match &self.params {
            Params::EC(ec) => match ec.curve.as_deref() {
                Some("P-256") => Some(Algorithm::ES256),
                Some("P-384") => Some(Algorithm::ES384),
                _ => None,
            },
            Params::RSA(_) => Some(Algorithm::RS256),
            Params::OKP(okp) if okp.curve == "Ed25519" => Some(Algorithm::EdDSA),
            Params::OKP(_) => None,
        }
    }
}

impl ECParams {
    fn sec1_uncompressed(&self, coordinate_len: usize) -> Result<Vec<u8>, Error> {
        let x = self.x_coordinate.as_ref().ok_or(Error::MissingPublicKey)?;
        let y = self.y_coordinate.as_ref().ok_or(Error::MissingPublicKey)?;
        if x.0.len() != coordinate_len || y.0.len() != coordinate_len {
            return Err(Error::InvalidKeyLength);
        }
        Ok([&[0x04][..], &x.0, &y.0].concat())
    }

    fn expect_curve(&self, expected: &str) -> Result<(), Error> {
        let curve = self.curve.as_ref().ok_or(Error::MissingCurve)?;
        if curve != expected {
            return Err(Error::CurveNotImplemented(curve.to_string()));
        }
        Ok(())
    }
}

#[cfg(feature = "secp256r1")]
impl TryFrom<&ECParams> for p256::PublicKey {
    type Error = Error;
    fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
        params.expect_curve("P-256")?;
        let encoded = params.sec1_uncompressed(32)?;
        p256::PublicKey::from_sec1_bytes(&encoded).map_err(Error::crypto)
    }
}

#[cfg(feature = "secp256r1")]
impl TryFrom<&ECParams> for p256::SecretKey {
    type Error = Error;
    fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
        params.expect_curve("P-256")?;
        let d = params.ecc_private_key.as_ref().ok_or(Error::MissingPrivateKey)?;
        p256::SecretKey::from_slice(&d.0).map_err(Error::crypto)
    }
}

#[cfg(feature = "secp256r1")]
impl From<&p256::PublicKey> for ECParams {
    fn from(pk: &p256::PublicKey) -> Self {
        use p256::elliptic_curve::sec1::ToEncodedPoint;
        let encoded = pk.to_encoded_point(false);
        ECParams {
            curve: Some("P-256".to_string()),
            x_coordinate: encoded.x().map(|x| Base64urlUInt(x.to_vec())),
            y_coordinate: encoded.y().map(|y| Base64urlUInt(y.to_vec())),
            ecc_private_key: None,
        }
    }
}

#[cfg(feature = "secp384r1")]
impl TryFrom<&ECParams> for p384::PublicKey {
    type Error = Error;
    fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
        params.expect_curve("P-384")?;
        let encoded = params.sec1_uncompressed(48)?;
        p384::PublicKey::from_sec1_bytes(&encoded).map_err(Error::crypto)
    }
}

#[cfg(feature = "secp384r1")]
impl TryFrom<&ECParams> for p384::SecretKey {
    type Error = Error;
    fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
        params.expect_curve("P-384")?;
        let d = params.ecc_private_key.as_ref().ok_or(Error::MissingPrivateKey)?;
        p384::SecretKey::from_slice(&d.0).map_err(Error::crypto)
    }
}

#[cfg(feature = "secp384r1")]
impl From<&p384::PublicKey> for ECParams {
    fn from(pk: &p384::PublicKey) -> Self {
        use p384::elliptic_curve::sec1::ToEncodedPoint;
        let encoded = pk.to_encoded_point(false);
        ECParams {
            curve: Some("P-384".to_string()),
            x_coordinate: encoded.x().map(|x| Base64urlUInt(x.to_vec())),
            y_coordinate: encoded.y().map(|y| Base64urlUInt(y.to_vec())),
            ecc_private_key: None,
        }
    }
}

#[cfg(feature = "ed25519")]
impl TryFrom<&OctetParams> for ed25519_dalek::VerifyingKey {
    type Error = Error;
    fn try_from(params: &OctetParams) -> Result<Self, Self::Error> {
        if params.curve != "Ed25519" {
            return Err(Error::CurveNotImplemented(params.curve.clone()));
        }
        let bytes: [u8; 32] = params
            .public_key
            .0
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidKeyLength)?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(Error::crypto)
    }
}

#[cfg(feature = "ed25519")]
impl TryFrom<&OctetParams> for ed25519_dalek::SigningKey {
    type Error = Error;
    fn try_from(params: &OctetParams) -> Result<Self, Self::Error> {
        if params.curve != "Ed25519" {
            return Err(Error::CurveNotImplemented(params.curve.clone()));
        }
        let private_key = params.private_key.as_ref().ok_or(Error::MissingPrivateKey)?;
        let bytes: [u8; 32] = private_key
            .0
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidKeyLength)?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }
}

#[cfg(feature = "rsa")]
impl RSAParams {
    pub fn validate_key_size(&self) -> Result<(), Error> {
        let n = self.modulus.as_ref().ok_or(Error::MissingModulus)?;
        if n.0.len() * 8 < RSA_MIN_MODULUS_BITS {
            return Err(Error::InvalidKeyLength);
        }
        Ok(())
    }
}

#[cfg(feature = "rsa")]
impl TryFrom<&RSAParams> for rsa::RsaPublicKey {
    type Error = Error;
    fn try_from(params: &RSAParams) -> Result<Self, Self::Error> {
        let n = params.modulus.as_ref().ok_or(Error::MissingModulus)?;
        let e = params.exponent.as_ref().ok_or(Error::MissingExponent)?;
        Ok(rsa::RsaPublicKey::new(
            rsa::BigUint::from_bytes_be(&n.0),
            rsa::BigUint::from_bytes_be(&e.0),
        )?)
    }
}

#[cfg(feature = "rsa")]
impl TryFrom<&RSAParams> for rsa::RsaPrivateKey {
    type Error = Error;
    fn try_from(params: &RSAParams) -> Result<Self, Self::Error> {
        let uint = |v: &Option<Base64urlUInt>, missing: Error| {
            v.as_ref()
                .map(|v| rsa::BigUint::from_bytes_be(&v.0))
                .ok_or(missing)
        };
        let n = uint(&params.modulus, Error::MissingModulus)?;
        let e = uint(&params.exponent, Error::MissingExponent)?;
        let d = uint(&params.private_exponent, Error::MissingPrivateKey)?;
        let p = uint(&params.first_prime_factor, Error::MissingPrime)?;
        let q = uint(&params.second_prime_factor, Error::MissingPrime)?;
        Ok(rsa::RsaPrivateKey::from_components(n, e, d, vec![p, q])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ec_jwk_from_json() {
        let jwk: JWK = serde_json::from_value(json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "c01opxmxLeRMYhyTaiOKzvOF6DDjEajzb968ClJWB9Q",
            "y": "oM3B1R0J-Cynleb00D-PManSGnlltcgsMJaoPbPOewU",
            "d": "g-jUBRnfkbsxOQhtrBZd9l_ElOAw8BoJufTFUut2uHI"
        }))
        .unwrap();
        assert!(!jwk.is_public());
        assert_eq!(jwk.get_algorithm(), Some(Algorithm::ES256));

        let public = jwk.to_public();
        assert!(public.is_public());
        let value = serde_json::to_value(&public).unwrap();
        assert_eq!(value["kty"], "EC");
        assert!(value.get("d").is_none());
    }

    #[test]
    fn algorithm_serialization() {
        assert_eq!(serde_json::to_value(Algorithm::None).unwrap(), "none");
        assert_eq!(serde_json::to_value(Algorithm::EdDSA).unwrap(), "EdDSA");
        let alg: Algorithm = serde_json::from_value(json!("PS256")).unwrap();
        assert_eq!(alg, Algorithm::PS256);
    }

    #[test]
    #[cfg(feature = "secp384r1")]
    fn p384_round_trip_public_key() {
        let jwk = JWK::generate_p384();
        assert_eq!(jwk.get_algorithm(), Some(Algorithm::ES384));
        match &jwk.params {
            Params::EC(ec) => {
                let secret = p384::SecretKey::try_from(ec).unwrap();
                let public = p384::PublicKey::try_from(ec).unwrap();
                assert_eq!(secret.public_key(), public);
            }
            _ => panic!("expected EC key"),
        }
    }

    #[test]
    #[cfg(feature = "secp256r1")]
    fn wrong_curve_rejected() {
        let jwk = JWK::generate_p256();
        match &jwk.params {
            Params::EC(ec) => {
                #[cfg(feature = "secp384r1")]
                assert!(matches!(
                    p384::PublicKey::try_from(ec),
                    Err(Error::CurveNotImplemented(_))
                ));
                p256::PublicKey::try_from(ec).unwrap();
            }
            _ => panic!("expected EC key"),
        }
    }
}
