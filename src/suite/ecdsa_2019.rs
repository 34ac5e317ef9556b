//! `ecdsa-2019` cryptosuite.
//!
//! JCS canonicalization, SHA-256 digests, ES256 for P-256 keys and ES384
//! for P-384 keys. The signature is a base58-btc multibase `proofValue`.
use crate::error::Error;
use crate::jwk::{Algorithm, Params, JWK};
use crate::proof::ProofType;

use super::{SignatureEncoding, SignatureSuite};

#[derive(Debug, Default, Clone, Copy)]
pub struct Ecdsa2019;

impl Ecdsa2019 {
    pub const NAME: &'static str = "ecdsa-2019";
}

impl SignatureSuite for Ecdsa2019 {
    fn suite_type(&self) -> &'static str {
        Self::NAME
    }

    fn proof_type(&self) -> ProofType {
        ProofType::DataIntegrityProof
    }

    fn cryptosuite(&self) -> Option<&'static str> {
        Some(Self::NAME)
    }

    fn signature_encoding(&self) -> SignatureEncoding {
        SignatureEncoding::Multibase
    }

    fn compact_proof(&self) -> bool {
        true
    }

    fn algorithm(&self, key: &JWK) -> Result<Algorithm, Error> {
        match &key.params {
            Params::EC(ec) => match ec.curve.as_deref() {
                Some("P-256") => Ok(Algorithm::ES256),
                Some("P-384") => Ok(Algorithm::ES384),
                Some(curve) => Err(Error::UnsupportedKey(format!(
                    "{} does not support curve {curve}",
                    Self::NAME
                ))),
                None => Err(Error::MissingCurve),
            },
            _ => Err(Error::UnsupportedKey(format!(
                "{} requires an EC key",
                Self::NAME
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(feature = "secp256r1", feature = "secp384r1"))]
    fn algorithm_follows_curve() {
        assert_eq!(
            Ecdsa2019.algorithm(&JWK::generate_p256()).unwrap(),
            Algorithm::ES256
        );
        assert_eq!(
            Ecdsa2019.algorithm(&JWK::generate_p384()).unwrap(),
            Algorithm::ES384
        );
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn rejects_okp_keys() {
        assert!(matches!(
            Ecdsa2019.algorithm(&JWK::generate_ed25519()),
            Err(Error::UnsupportedKey(_))
        ));
    }

    #[test]
    fn accepts_own_tag_only() {
        assert!(Ecdsa2019.accept("ecdsa-2019"));
        assert!(!Ecdsa2019.accept("ecdsa-rdfc-2019"));
        assert!(!Ecdsa2019.accept("eddsa-2022"));
    }
}
