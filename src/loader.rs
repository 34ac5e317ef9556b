//! JSON-LD context document loading.
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::Error;

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIALS_V2_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";
pub const DATA_INTEGRITY_V2_CONTEXT: &str = "https://w3id.org/security/data-integrity/v2";
pub const JWS_2020_V1_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";

/// Resolves remote JSON-LD context documents by URL.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, url: &str) -> Result<Value, Error>;
}

impl<T: DocumentLoader + ?Sized> DocumentLoader for Arc<T> {
    fn load(&self, url: &str) -> Result<Value, Error> {
        T::load(self, url)
    }
}

/// Loader backed by an in-memory table of documents.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: HashMap<String, Value>,
}

impl StaticLoader {
    /// A loader with no documents.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A loader preloaded with the credential and security contexts used
    /// by the bundled suites.
    pub fn with_defaults() -> Self {
        let vocab = |prefix: &str| {
            json!({
                "@context": {
                    "@version": 1.1,
                    "@protected": true,
                    "id": "@id",
                    "type": "@type",
                    "@vocab": prefix
                }
            })
        };
        Self::empty()
            .with_document(
                CREDENTIALS_V1_CONTEXT,
                vocab("https://www.w3.org/2018/credentials#"),
            )
            .with_document(
                CREDENTIALS_V2_CONTEXT,
                vocab("https://www.w3.org/2018/credentials#"),
            )
            .with_document(DATA_INTEGRITY_V2_CONTEXT, vocab("https://w3id.org/security#"))
            .with_document(JWS_2020_V1_CONTEXT, vocab("https://w3id.org/security#"))
    }

    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }
}

impl DocumentLoader for StaticLoader {
    fn load(&self, url: &str) -> Result<Value, Error> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| Error::ResourceNotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_credentials_context() {
        let loader = StaticLoader::with_defaults();
        let doc = loader.load(CREDENTIALS_V2_CONTEXT).unwrap();
        assert_eq!(doc["@context"]["id"], "@id");
    }

    #[test]
    fn unknown_context() {
        let loader = StaticLoader::empty();
        assert!(matches!(
            loader.load("https://example.org/unknown"),
            Err(Error::ResourceNotFound(_))
        ));
    }
}
