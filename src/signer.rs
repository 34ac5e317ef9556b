//! Key management backends used when creating proofs.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::Error;
use crate::jwk::{Algorithm, JWK};
use crate::verification_method::VerificationMethod;

/// Produces raw signatures with a secret key.
pub trait MessageSigner: Send + Sync {
    fn sign(&self, algorithm: Algorithm, message: &[u8]) -> Result<Vec<u8>, Error>;
}

impl MessageSigner for JWK {
    fn sign(&self, algorithm: Algorithm, message: &[u8]) -> Result<Vec<u8>, Error> {
        crate::jws::sign_bytes(algorithm, message, self)
    }
}

impl<T: MessageSigner + ?Sized> MessageSigner for Arc<T> {
    fn sign(&self, algorithm: Algorithm, message: &[u8]) -> Result<Vec<u8>, Error> {
        T::sign(self, algorithm, message)
    }
}

/// Finds the signer for a verification method.
pub trait SignerGetter: Send + Sync {
    fn signer_for(&self, method: &VerificationMethod) -> Result<Arc<dyn MessageSigner>, Error>;
}

/// Uses the same secret key for every verification method.
#[derive(Clone)]
pub struct SingleSecretSigner {
    secret: Arc<dyn MessageSigner>,
}

impl SingleSecretSigner {
    pub fn new(secret: impl MessageSigner + 'static) -> Self {
        Self {
            secret: Arc::new(secret),
        }
    }
}

impl SignerGetter for SingleSecretSigner {
    fn signer_for(&self, _method: &VerificationMethod) -> Result<Arc<dyn MessageSigner>, Error> {
        Ok(self.secret.clone())
    }
}

/// In-memory secret keys indexed by verification method id.
#[derive(Default)]
pub struct LocalKeyStore {
    keys: RwLock<HashMap<String, Arc<JWK>>>,
}

impl LocalKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, method_id: impl Into<String>, key: JWK) -> Result<(), Error> {
        if key.is_public() {
            return Err(Error::MissingPrivateKey);
        }
        self.keys
            .write()
            .map_err(Error::crypto)?
            .insert(method_id.into(), Arc::new(key));
        Ok(())
    }

    pub fn remove(&self, method_id: &str) -> Option<Arc<JWK>> {
        self.keys.write().ok()?.remove(method_id)
    }
}

impl SignerGetter for LocalKeyStore {
    fn signer_for(&self, method: &VerificationMethod) -> Result<Arc<dyn MessageSigner>, Error> {
        let keys = self.keys.read().map_err(Error::crypto)?;
        match keys.get(&method.id) {
            Some(key) => Ok(key.clone() as Arc<dyn MessageSigner>),
            None => Err(Error::KeyNotFound(method.id.clone())),
        }
    }
}
