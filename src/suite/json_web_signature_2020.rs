//! `JsonWebSignature2020` suite.
//!
//! The signature is a detached JWS over the unencoded signing input
//! (RFC 7797), and proof terms are expanded rather than compacted against
//! the document context. Any algorithm the key supports is accepted.
use crate::error::Error;
use crate::jwk::{Algorithm, JWK};
use crate::proof::ProofType;

use super::{SignatureEncoding, SignatureSuite};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWebSignature2020;

impl JsonWebSignature2020 {
    pub const NAME: &'static str = "JsonWebSignature2020";
}

impl SignatureSuite for JsonWebSignature2020 {
    fn suite_type(&self) -> &'static str {
        Self::NAME
    }

    fn proof_type(&self) -> ProofType {
        ProofType::JsonWebSignature2020
    }

    fn cryptosuite(&self) -> Option<&'static str> {
        None
    }

    fn signature_encoding(&self) -> SignatureEncoding {
        SignatureEncoding::DetachedJws
    }

    fn compact_proof(&self) -> bool {
        false
    }

    fn algorithm(&self, key: &JWK) -> Result<Algorithm, Error> {
        match key.get_algorithm() {
            Some(Algorithm::None) | None => Err(Error::UnsupportedKey(format!(
                "no {} algorithm for key",
                Self::NAME
            ))),
            Some(algorithm) => Ok(algorithm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "rsa")]
    fn rsa_defaults_to_rs256() {
        let key = crate::jws::tests::rfc7515_rsa_key();
        assert_eq!(
            JsonWebSignature2020.algorithm(&key).unwrap(),
            Algorithm::RS256
        );
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn ed25519_uses_eddsa() {
        assert_eq!(
            JsonWebSignature2020
                .algorithm(&JWK::generate_ed25519())
                .unwrap(),
            Algorithm::EdDSA
        );
    }
}
