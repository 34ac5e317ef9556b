//! Signature suites.
//!
//! A suite bundles a canonicalization algorithm, a digest and a signature
//! check under a single type tag. Suites are looked up by exact tag in a
//! [`SuiteRegistry`].
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::jwk::{Algorithm, JWK};
use crate::loader::DocumentLoader;
use crate::proof::{Proof, ProofType};
use crate::verification_method::PublicKey;

mod ecdsa_2019;
mod eddsa_2022;
mod json_web_signature_2020;

pub use ecdsa_2019::Ecdsa2019;
pub use eddsa_2022::EdDsa2022;
pub use json_web_signature_2020::JsonWebSignature2020;

/// Vocabulary used to expand proof terms when a suite does not use compact
/// proofs.
pub const SECURITY_VOCAB: &str = "https://w3id.org/security#";

/// How the signature is embedded in a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    /// Base58-btc multibase `proofValue`.
    Multibase,
    /// Detached compact JWS with an unencoded payload (`b64: false`).
    DetachedJws,
}

/// Canonicalization inputs shared by every suite.
#[derive(Clone, Default)]
pub struct CanonicalizationOptions {
    pub document_loader: Option<Arc<dyn DocumentLoader>>,
}

impl CanonicalizationOptions {
    pub fn new(document_loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            document_loader: Some(document_loader),
        }
    }
}

impl fmt::Debug for CanonicalizationOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CanonicalizationOptions")
            .field("document_loader", &self.document_loader.is_some())
            .finish()
    }
}

pub trait SignatureSuite: Send + Sync {
    /// Exact type tag of the suite.
    fn suite_type(&self) -> &'static str;

    /// Name used in error messages.
    fn name(&self) -> &'static str {
        self.suite_type()
    }

    /// `true` only for this suite's own type tag.
    fn accept(&self, suite_type: &str) -> bool {
        suite_type == self.suite_type()
    }

    fn proof_type(&self) -> ProofType;

    /// Value of the proof's `cryptosuite` member, if any.
    fn cryptosuite(&self) -> Option<&'static str>;

    fn signature_encoding(&self) -> SignatureEncoding;

    /// Whether the proof skeleton reuses the document `@context` instead of
    /// expanded terms.
    fn compact_proof(&self) -> bool;

    /// Signature algorithm this suite uses with `key`.
    fn algorithm(&self, key: &JWK) -> Result<Algorithm, Error>;

    fn canonical_document(
        &self,
        document: &Value,
        options: &CanonicalizationOptions,
    ) -> Result<Vec<u8>, Error> {
        canonicalize_json(document, options)
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        crate::hash::sha256(data).to_vec()
    }

    /// Checks `signature` over `data` with `public_key`.
    fn verify(&self, public_key: &PublicKey, data: &[u8], signature: &[u8]) -> Result<(), Error> {
        let key = public_key.to_jwk()?;
        let algorithm = self.algorithm(&key)?;
        crate::jws::verify_bytes(algorithm, data, &key, signature)
    }

    /// Proof configuration covered by the signature: the skeleton, with
    /// either the document `@context` or fully expanded terms.
    fn proof_configuration(&self, skeleton: &Proof, document: &Value) -> Result<Value, Error> {
        let map = match serde_json::to_value(skeleton)? {
            Value::Object(map) => map,
            _ => return Err(Error::Canonicalization("proof is not an object".to_string())),
        };
        if self.compact_proof() {
            let mut map = map;
            if let Some(context) = document.get("@context") {
                map.insert("@context".to_string(), context.clone());
            }
            Ok(Value::Object(map))
        } else {
            Ok(Value::Object(expand_terms(map)))
        }
    }
}

fn expand_terms(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| match key.as_str() {
            "type" => ("@type".to_string(), value),
            "id" => ("@id".to_string(), value),
            _ if key.starts_with('@') => (key, value),
            _ => (format!("{SECURITY_VOCAB}{key}"), value),
        })
        .collect()
}

/// Canonical JSON (RFC 8785) of `document` without its `proof`.
///
/// Every remote `@context` the document references must be resolvable by
/// the configured loader. Loaded documents are not used to expand terms:
/// the object is canonicalized as written.
pub fn canonicalize_json(
    document: &Value,
    options: &CanonicalizationOptions,
) -> Result<Vec<u8>, Error> {
    let mut map = match document {
        Value::Object(map) => map.clone(),
        _ => {
            return Err(Error::Canonicalization(
                "document is not a JSON object".to_string(),
            ))
        }
    };
    map.remove("proof");
    for url in remote_contexts(map.get("@context")) {
        let loader = options.document_loader.as_ref().ok_or_else(|| {
            Error::Canonicalization(format!("no document loader to resolve `{url}`"))
        })?;
        loader
            .load(url)
            .map_err(|e| Error::Canonicalization(format!("unable to load `{url}`: {e}")))?;
    }
    serde_jcs::to_vec(&Value::Object(map)).map_err(|e| Error::Canonicalization(e.to_string()))
}

fn remote_contexts(context: Option<&Value>) -> Vec<&str> {
    match context {
        Some(Value::String(url)) => vec![url.as_str()],
        Some(Value::Array(entries)) => entries.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Suites indexed by their exact type tag.
#[derive(Clone)]
pub struct SuiteRegistry {
    suites: HashMap<String, Arc<dyn SignatureSuite>>,
}

impl SuiteRegistry {
    pub fn empty() -> Self {
        Self {
            suites: HashMap::new(),
        }
    }

    pub fn new(suites: impl IntoIterator<Item = Arc<dyn SignatureSuite>>) -> Self {
        let mut registry = Self::empty();
        for suite in suites {
            registry.register(suite);
        }
        registry
    }

    /// Registers `suite`, replacing any suite with the same type tag.
    pub fn register(&mut self, suite: Arc<dyn SignatureSuite>) {
        self.suites.insert(suite.suite_type().to_string(), suite);
    }

    /// The single suite accepting `suite_type`.
    pub fn get(&self, suite_type: &str) -> Result<&Arc<dyn SignatureSuite>, Error> {
        self.suites
            .get(suite_type)
            .filter(|suite| suite.accept(suite_type))
            .ok_or_else(|| Error::UnsupportedSuite(suite_type.to_string()))
    }

    pub fn suite_types(&self) -> impl Iterator<Item = &str> {
        self.suites.keys().map(String::as_str)
    }
}

impl Default for SuiteRegistry {
    fn default() -> Self {
        Self::new(default_suites())
    }
}

impl fmt::Debug for SuiteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.suite_types()).finish()
    }
}

/// The bundled suites.
pub fn default_suites() -> Vec<Arc<dyn SignatureSuite>> {
    vec![
        Arc::new(Ecdsa2019),
        Arc::new(EdDsa2022),
        Arc::new(JsonWebSignature2020),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{StaticLoader, CREDENTIALS_V2_CONTEXT};
    use serde_json::json;

    fn options() -> CanonicalizationOptions {
        CanonicalizationOptions::new(Arc::new(StaticLoader::with_defaults()))
    }

    #[test]
    fn registry_exact_match() {
        let registry = SuiteRegistry::default();
        assert_eq!(registry.get("ecdsa-2019").unwrap().name(), "ecdsa-2019");
        assert!(matches!(
            registry.get("ecdsa-2019 "),
            Err(Error::UnsupportedSuite(_))
        ));
        assert!(matches!(
            registry.get("ECDSA-2019"),
            Err(Error::UnsupportedSuite(_))
        ));
        assert!(matches!(
            SuiteRegistry::empty().get("eddsa-2022"),
            Err(Error::UnsupportedSuite(_))
        ));
    }

    #[test]
    fn canonical_form_ignores_key_order_and_proof() {
        let a = json!({"@context": [CREDENTIALS_V2_CONTEXT], "b": 1, "a": {"y": 2, "x": 1}});
        let b = json!({
            "a": {"x": 1, "y": 2},
            "proof": {"type": "DataIntegrityProof"},
            "b": 1,
            "@context": [CREDENTIALS_V2_CONTEXT]
        });
        let suite = Ecdsa2019;
        let ca = suite.canonical_document(&a, &options()).unwrap();
        let cb = suite.canonical_document(&b, &options()).unwrap();
        assert_eq!(ca, cb);
        assert_eq!(
            String::from_utf8(ca).unwrap(),
            r#"{"@context":["https://www.w3.org/ns/credentials/v2"],"a":{"x":1,"y":2},"b":1}"#
        );
    }

    #[test]
    fn unresolvable_context_fails() {
        let doc = json!({"@context": ["https://example.org/unknown/v1"], "a": 1});
        assert!(matches!(
            canonicalize_json(&doc, &options()),
            Err(Error::Canonicalization(_))
        ));
        let doc = json!({"@context": [CREDENTIALS_V2_CONTEXT]});
        assert!(matches!(
            canonicalize_json(&doc, &CanonicalizationOptions::default()),
            Err(Error::Canonicalization(_))
        ));
    }

    #[test]
    fn non_object_document() {
        assert!(matches!(
            canonicalize_json(&json!([1, 2]), &options()),
            Err(Error::Canonicalization(_))
        ));
    }

    #[test]
    fn expanded_terms() {
        let map = json!({"type": "JsonWebSignature2020", "proofPurpose": "assertionMethod"});
        let Value::Object(map) = map else { unreachable!() };
        let expanded = expand_terms(map);
        assert_eq!(expanded["@type"], "JsonWebSignature2020");
        assert_eq!(
            expanded["https://w3id.org/security#proofPurpose"],
            "assertionMethod"
        );
    }
}
