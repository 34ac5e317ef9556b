//! `eddsa-2022` cryptosuite: JCS, SHA-256 and Ed25519.
use crate::error::Error;
use crate::jwk::{Algorithm, Params, JWK};
use crate::proof::ProofType;

use super::{SignatureEncoding, SignatureSuite};

#[derive(Debug, Default, Clone, Copy)]
pub struct EdDsa2022;

impl EdDsa2022 {
    pub const NAME: &'static str = "eddsa-2022";
}

impl SignatureSuite for EdDsa2022 {
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
            Params::OKP(okp) if okp.curve == "Ed25519" => Ok(Algorithm::EdDSA),
            _ => Err(Error::UnsupportedKey(format!(
                "{} requires an Ed25519 key",
                Self::NAME
            ))),
        }
    }
}
