//! Proofs for Verifiable Credentials.
//!
//! Two families of proofs are supported:
//! - [Data Integrity][data-integrity] proofs, embedded next to the claims
//!   they secure and produced by a pluggable [`SignatureSuite`]; and
//! - credentials encoded as [JSON Web Tokens][jwt] and secured with a
//!   compact [JSON Web Signature][jws].
//!
//! [data-integrity]: <https://www.w3.org/TR/vc-data-integrity/>
//! [jwt]: <https://www.rfc-editor.org/rfc/rfc7519>
//! [jws]: <https://www.rfc-editor.org/rfc/rfc7515>
//!
//! # Basic Usage
//!
//! ```
//! use serde_json::json;
//! use vc_proof::{
//!     ProofOptions, Signer, SignerOptions, SingleSecretSigner, VerificationMethod, Verifier,
//!     JWK,
//! };
//!
//! let credential = json!({
//!     "@context": ["https://www.w3.org/ns/credentials/v2"],
//!     "type": ["VerifiableCredential"],
//!     "issuer": "did:example:issuer",
//!     "credentialSubject": { "id": "did:example:subject" }
//! });
//!
//! // Create a random signing key and describe its public part.
//! let key = JWK::generate_p256();
//! let method = VerificationMethod::from_jwk(
//!     "did:example:issuer#key-1",
//!     "JsonWebKey2020",
//!     "did:example:issuer",
//!     &key,
//! );
//! let options = ProofOptions::new(method, "ecdsa-2019");
//!
//! // Sign.
//! let signer = Signer::new(SignerOptions::new(SingleSecretSigner::new(key)));
//! let proof = signer.create_proof(&credential, &options).unwrap();
//!
//! // Verify.
//! Verifier::default()
//!     .verify_proof(&credential, &proof, &options)
//!     .unwrap();
//! ```
#![cfg_attr(docsrs, feature(doc_auto_cfg), feature(doc_cfg))]

pub mod data_integrity;
pub mod error;
pub mod hash;
pub mod jose;
pub mod jwk;
pub mod jws;
pub mod jwt;
pub mod loader;
pub mod multicodec;
pub mod proof;
pub mod signer;
pub mod suite;
pub mod verification_method;

pub use data_integrity::{Signer, SignerOptions, Verifier, VerifierOptions};
pub use error::{Error, Result};
pub use jose::{
    Headers, JoseSigner, JoseVerifier, KeyProofChecker, KeyProofCreator, ProofChecker,
    ProofCreator, SignParameters,
};
pub use jwk::{Algorithm, JWK};
pub use jwt::{decode_cred_jws, encode_cred_jws, JwtCredClaims};
pub use loader::{DocumentLoader, StaticLoader};
pub use proof::{Proof, ProofOptions, ProofType};
pub use signer::{LocalKeyStore, MessageSigner, SignerGetter, SingleSecretSigner};
pub use suite::{
    CanonicalizationOptions, Ecdsa2019, EdDsa2022, JsonWebSignature2020, SignatureSuite,
    SuiteRegistry,
};
pub use verification_method::{PublicKey, VerificationMethod};
