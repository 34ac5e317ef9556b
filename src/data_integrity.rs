//! Data Integrity proof creation and verification.
//!
//! A proof signs `digest(proof configuration) || digest(document)`, both
//! canonicalized by the suite selected from the proof options.
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::Value;

use crate::error::Error;
use crate::jws;
use crate::loader::{DocumentLoader, StaticLoader};
use crate::proof::{Proof, ProofOptions};
use crate::signer::SignerGetter;
use crate::suite::{
    default_suites, CanonicalizationOptions, SignatureEncoding, SignatureSuite, SuiteRegistry,
};

/// Configuration of a proof [`Signer`].
#[derive(Clone)]
pub struct SignerOptions {
    pub signer_getter: Arc<dyn SignerGetter>,
    pub document_loader: Arc<dyn DocumentLoader>,
    pub suites: Vec<Arc<dyn SignatureSuite>>,
}

impl SignerOptions {
    /// Options using the bundled suites and context documents.
    pub fn new(signer_getter: impl SignerGetter + 'static) -> Self {
        Self {
            signer_getter: Arc::new(signer_getter),
            document_loader: Arc::new(StaticLoader::with_defaults()),
            suites: default_suites(),
        }
    }

    pub fn with_document_loader(mut self, loader: impl DocumentLoader + 'static) -> Self {
        self.document_loader = Arc::new(loader);
        self
    }

    pub fn with_suites(mut self, suites: Vec<Arc<dyn SignatureSuite>>) -> Self {
        self.suites = suites;
        self
    }
}

/// Configuration of a proof [`Verifier`].
#[derive(Clone)]
pub struct VerifierOptions {
    pub document_loader: Arc<dyn DocumentLoader>,
    pub suites: Vec<Arc<dyn SignatureSuite>>,
}

impl VerifierOptions {
    pub fn with_document_loader(mut self, loader: impl DocumentLoader + 'static) -> Self {
        self.document_loader = Arc::new(loader);
        self
    }

    pub fn with_suites(mut self, suites: Vec<Arc<dyn SignatureSuite>>) -> Self {
        self.suites = suites;
        self
    }
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            document_loader: Arc::new(StaticLoader::with_defaults()),
            suites: default_suites(),
        }
    }
}

/// Proof creator.
pub struct Signer {
    registry: SuiteRegistry,
    signer_getter: Arc<dyn SignerGetter>,
    canonicalization: CanonicalizationOptions,
}

impl Signer {
    pub fn new(options: SignerOptions) -> Self {
        Self {
            registry: SuiteRegistry::new(options.suites),
            signer_getter: options.signer_getter,
            canonicalization: CanonicalizationOptions::new(options.document_loader),
        }
    }

    /// Creates a proof over `document`. The document itself is not modified.
    pub fn create_proof(&self, document: &Value, options: &ProofOptions) -> Result<Proof, Error> {
        options.validate()?;
        let suite = self.registry.get(&options.suite_type)?;
        if options.proof_type != suite.proof_type() {
            return Err(Error::InvalidProofOptions(format!(
                "suite {} produces {} proofs, not {}",
                suite.name(),
                suite.proof_type().name(),
                options.proof_type.name()
            )));
        }
        log::debug!(
            "creating {} proof with {}",
            suite.name(),
            options.verification_method_id
        );

        let key = options.verification_method.public_key()?.to_jwk()?;
        let algorithm = suite.algorithm(&key)?;

        let created = options.created.unwrap_or_else(Utc::now).trunc_subsecs(0);
        let mut proof = Proof {
            type_: suite.proof_type(),
            cryptosuite: suite.cryptosuite().map(ToOwned::to_owned),
            verification_method: options.verification_method_id.clone(),
            proof_purpose: options.purpose.clone(),
            created,
            domain: options.domain.clone(),
            challenge: options.challenge.clone(),
            proof_value: None,
            jws: None,
        };
        let input = signing_input(suite.as_ref(), document, &proof, &self.canonicalization)?;

        let signer = self
            .signer_getter
            .signer_for(&options.verification_method)
            .map_err(|e| Error::Signing(Box::new(e)))?;
        match suite.signature_encoding() {
            SignatureEncoding::Multibase => {
                let signature = signer
                    .sign(algorithm, &input)
                    .map_err(|e| Error::Signing(Box::new(e)))?;
                proof.proof_value = Some(multibase::encode(multibase::Base::Base58Btc, signature));
            }
            SignatureEncoding::DetachedJws => {
                let jws = jws::detached_sign_unencoded_payload(algorithm, &input, |message| {
                    signer
                        .sign(algorithm, message)
                        .map_err(|e| Error::Signing(Box::new(e)))
                })?;
                proof.jws = Some(jws);
            }
        }
        Ok(proof)
    }

    /// Returns a copy of `document` with a new proof attached under `proof`.
    pub fn add_proof(&self, document: &Value, options: &ProofOptions) -> Result<Value, Error> {
        let proof = self.create_proof(document, options)?;
        let mut document = document.clone();
        match &mut document {
            Value::Object(map) => {
                map.insert("proof".to_string(), serde_json::to_value(proof)?);
            }
            _ => {
                return Err(Error::Canonicalization(
                    "document is not a JSON object".to_string(),
                ))
            }
        }
        Ok(document)
    }
}

/// Proof verifier.
pub struct Verifier {
    registry: SuiteRegistry,
    canonicalization: CanonicalizationOptions,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(VerifierOptions::default())
    }
}

impl Verifier {
    pub fn new(options: VerifierOptions) -> Self {
        Self {
            registry: SuiteRegistry::new(options.suites),
            canonicalization: CanonicalizationOptions::new(options.document_loader),
        }
    }

    pub fn verify_proof(
        &self,
        document: &Value,
        proof: &Proof,
        options: &ProofOptions,
    ) -> Result<(), Error> {
        self.verify_proof_at(document, proof, options, Utc::now())
    }

    /// Verifies `proof` as if the current time were `now`.
    pub fn verify_proof_at(
        &self,
        document: &Value,
        proof: &Proof,
        options: &ProofOptions,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let suite = self.registry.get(&options.suite_type)?;
        log::debug!(
            "verifying {} proof from {}",
            suite.name(),
            proof.verification_method
        );
        self.check_proof(suite.as_ref(), document, proof, options, now)
            .map_err(|e| {
                log::warn!("{} proof rejected: {e}", suite.name());
                Error::verification_failed(suite.name(), e)
            })
    }

    /// Verifies the proof embedded in `document` under `proof`.
    pub fn verify_attached(&self, document: &Value, options: &ProofOptions) -> Result<(), Error> {
        let proof = document
            .get("proof")
            .ok_or(Error::MissingProofSignature)?;
        let proof: Proof = serde_json::from_value(proof.clone())?;
        self.verify_proof(document, &proof, options)
    }

    fn check_proof(
        &self,
        suite: &dyn SignatureSuite,
        document: &Value,
        proof: &Proof,
        options: &ProofOptions,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        expect_equal(
            "verificationMethod",
            &options.verification_method_id,
            &proof.verification_method,
        )?;
        expect_equal("type", options.proof_type.name(), proof.type_.name())?;
        expect_equal("type", suite.proof_type().name(), proof.type_.name())?;
        expect_equal(
            "cryptosuite",
            suite.cryptosuite().unwrap_or_default(),
            proof.cryptosuite.as_deref().unwrap_or_default(),
        )?;
        expect_equal("proofPurpose", &options.purpose, &proof.proof_purpose)?;
        if let Some(domain) = &options.domain {
            expect_equal("domain", domain, proof.domain.as_deref().unwrap_or_default())?;
        }
        if let Some(challenge) = &options.challenge {
            expect_equal(
                "challenge",
                challenge,
                proof.challenge.as_deref().unwrap_or_default(),
            )?;
        }
        if options.is_expired(proof.created, now) {
            return Err(Error::ProofExpired {
                created: proof.created,
                max_age: options.max_age.unwrap_or_else(Duration::zero),
            });
        }

        let public_key = options.verification_method.public_key()?;
        let input = signing_input(suite, document, &proof.skeleton(), &self.canonicalization)?;
        match suite.signature_encoding() {
            SignatureEncoding::Multibase => {
                let signature = proof.signature_bytes()?;
                suite.verify(&public_key, &input, &signature)
            }
            SignatureEncoding::DetachedJws => {
                let jws = proof.jws.as_deref().ok_or(Error::MissingProofSignature)?;
                let key_algorithm = suite.algorithm(&public_key.to_jwk()?)?;
                jws::detached_verify(jws, &input, |header, message, signature| {
                    if header.base64urlencode_payload != Some(false) {
                        return Err(Error::ExpectedUnencodedHeader);
                    }
                    if header.algorithm != key_algorithm {
                        return Err(Error::AlgorithmMismatch);
                    }
                    suite.verify(&public_key, message, signature)
                })?;
                Ok(())
            }
        }
    }
}

fn expect_equal(field: &'static str, expected: &str, found: &str) -> Result<(), Error> {
    if expected != found {
        return Err(Error::IdentityMismatch {
            field,
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

fn signing_input(
    suite: &dyn SignatureSuite,
    document: &Value,
    skeleton: &Proof,
    options: &CanonicalizationOptions,
) -> Result<Vec<u8>, Error> {
    let document_canonical = suite.canonical_document(document, options)?;
    let configuration = suite.proof_configuration(skeleton, document)?;
    let configuration_canonical = suite.canonical_document(&configuration, options)?;
    Ok([
        suite.digest(&configuration_canonical),
        suite.digest(&document_canonical),
    ]
    .concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::JWK;
    use crate::loader::CREDENTIALS_V2_CONTEXT;
    use crate::signer::SingleSecretSigner;
    use crate::verification_method::{VerificationMethod, JSON_WEB_KEY_2020};
    use serde_json::json;

    fn credential() -> Value {
        json!({
            "@context": [CREDENTIALS_V2_CONTEXT],
            "type": ["VerifiableCredential"],
            "issuer": "did:foo:bar",
            "credentialSubject": {"id": "did:example:subject", "name": "Alice"}
        })
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn signing_input_layout() {
        let key = JWK::generate_ed25519();
        let vm = VerificationMethod::from_jwk("#key-1", JSON_WEB_KEY_2020, "did:foo:bar", &key);
        let signer = Signer::new(SignerOptions::new(SingleSecretSigner::new(key)));
        let proof = signer
            .create_proof(&credential(), &ProofOptions::new(vm, "eddsa-2022"))
            .unwrap();
        let input = signing_input(
            &crate::suite::EdDsa2022,
            &credential(),
            &proof.skeleton(),
            &signer.canonicalization,
        )
        .unwrap();
        assert_eq!(input.len(), 64);
        assert_eq!(proof.cryptosuite.as_deref(), Some("eddsa-2022"));
        assert!(proof.proof_value.as_deref().unwrap().starts_with('z'));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn proof_type_must_match_suite() {
        let key = JWK::generate_ed25519();
        let vm = VerificationMethod::from_jwk("#key-1", JSON_WEB_KEY_2020, "did:foo:bar", &key);
        let signer = Signer::new(SignerOptions::new(SingleSecretSigner::new(key)));
        let options = ProofOptions::new(vm, "eddsa-2022")
            .with_proof_type(crate::proof::ProofType::JsonWebSignature2020);
        assert!(matches!(
            signer.create_proof(&credential(), &options),
            Err(Error::InvalidProofOptions(_))
        ));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn proof_type_checked_on_verification() {
        let key = JWK::generate_ed25519();
        let vm = VerificationMethod::from_jwk("#key-1", JSON_WEB_KEY_2020, "did:foo:bar", &key);
        let options = ProofOptions::new(vm, "eddsa-2022");
        let signer = Signer::new(SignerOptions::new(SingleSecretSigner::new(key)));
        let proof = signer.create_proof(&credential(), &options).unwrap();

        let options = options.with_proof_type(crate::proof::ProofType::JsonWebSignature2020);
        let err = Verifier::default()
            .verify_proof(&credential(), &proof, &options)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ProofVerificationFailed { ref source, .. }
                if matches!(**source, Error::IdentityMismatch { field: "type", .. })
        ));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn tampered_document_rejected() {
        let key = JWK::generate_ed25519();
        let vm = VerificationMethod::from_jwk("#key-1", JSON_WEB_KEY_2020, "did:foo:bar", &key);
        let options = ProofOptions::new(vm, "eddsa-2022");
        let signer = Signer::new(SignerOptions::new(SingleSecretSigner::new(key)));
        let proof = signer.create_proof(&credential(), &options).unwrap();

        let mut tampered = credential();
        tampered["credentialSubject"]["name"] = json!("Mallory");
        let err = Verifier::default()
            .verify_proof(&tampered, &proof, &options)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ProofVerificationFailed { suite: "eddsa-2022", ref source }
                if matches!(**source, Error::InvalidSignature)
        ));
    }
}
