//! JOSE adapters between proof creators/checkers and the compact JWS
//! codec.
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::jwk::{Algorithm, JWK};
use crate::jws::{JwsSigner, JwsVerifier};
use crate::signer::MessageSigner;
use crate::verification_method::PublicKey;

/// JOSE protected header parameters.
pub type Headers = BTreeMap<String, Value>;

pub const HEADER_ALGORITHM: &str = "alg";
pub const HEADER_KEY_ID: &str = "kid";

/// Inputs used to build JOSE headers and select the signing algorithm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignParameters {
    /// `kid` header value.
    pub key_id: Option<String>,
    /// Signing algorithm. Derived from the key when absent.
    pub algorithm: Option<Algorithm>,
    /// Extra header parameters. `alg` and `kid` are not allowed here.
    pub additional_headers: Headers,
}

impl SignParameters {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: Some(key_id.into()),
            ..Default::default()
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_headers.insert(name.into(), value.into());
        self
    }
}

/// Builds JOSE headers and signs JWS signing inputs.
pub trait ProofCreator: Send + Sync {
    fn create_jwt_headers(&self, params: &SignParameters) -> Result<Headers, Error>;

    fn sign_jwt(&self, params: &SignParameters, data: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Checks the signature of a decoded JWS.
pub trait ProofChecker: Send + Sync {
    fn check_jwt_proof(
        &self,
        headers: &Headers,
        payload: &[u8],
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), Error>;
}

impl<T: ProofCreator + ?Sized> ProofCreator for Arc<T> {
    fn create_jwt_headers(&self, params: &SignParameters) -> Result<Headers, Error> {
        T::create_jwt_headers(self, params)
    }

    fn sign_jwt(&self, params: &SignParameters, data: &[u8]) -> Result<Vec<u8>, Error> {
        T::sign_jwt(self, params, data)
    }
}

impl<T: ProofChecker + ?Sized> ProofChecker for Arc<T> {
    fn check_jwt_proof(
        &self,
        headers: &Headers,
        payload: &[u8],
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), Error> {
        T::check_jwt_proof(self, headers, payload, signing_input, signature)
    }
}

/// [`ProofCreator`] backed by a message signer and its public key.
#[derive(Clone)]
pub struct KeyProofCreator {
    signer: Arc<dyn MessageSigner>,
    public_key: JWK,
}

impl KeyProofCreator {
    pub fn new(signer: Arc<dyn MessageSigner>, public_key: JWK) -> Self {
        Self { signer, public_key }
    }

    /// Uses a private JWK both to sign and to pick the algorithm.
    pub fn from_jwk(key: JWK) -> Result<Self, Error> {
        if key.is_public() {
            return Err(Error::MissingPrivateKey);
        }
        let public_key = key.to_public();
        Ok(Self::new(Arc::new(key), public_key))
    }

    fn algorithm(&self, params: &SignParameters) -> Result<Algorithm, Error> {
        match params.algorithm.or_else(|| self.public_key.get_algorithm()) {
            Some(Algorithm::None) | None => {
                Err(Error::UnsupportedAlgorithm(Algorithm::None.to_string()))
            }
            Some(algorithm) => Ok(algorithm),
        }
    }
}

impl ProofCreator for KeyProofCreator {
    fn create_jwt_headers(&self, params: &SignParameters) -> Result<Headers, Error> {
        let mut headers = Headers::new();
        for (name, value) in &params.additional_headers {
            if name == HEADER_ALGORITHM || name == HEADER_KEY_ID {
                return Err(Error::UnexpectedHeader(name.clone()));
            }
            headers.insert(name.clone(), value.clone());
        }
        let algorithm = self.algorithm(params)?;
        headers.insert(HEADER_ALGORITHM.to_string(), serde_json::to_value(algorithm)?);
        if let Some(key_id) = params.key_id.as_ref().or(self.public_key.key_id.as_ref()) {
            headers.insert(HEADER_KEY_ID.to_string(), Value::String(key_id.clone()));
        }
        Ok(headers)
    }

    fn sign_jwt(&self, params: &SignParameters, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.signer.sign(self.algorithm(params)?, data)
    }
}

/// [`ProofChecker`] resolving the public key from the JWT issuer and the
/// `kid` header.
pub struct KeyProofChecker<F> {
    fetcher: F,
}

impl<F> KeyProofChecker<F>
where
    F: Fn(&str, &str) -> Result<PublicKey, Error> + Send + Sync,
{
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F> ProofChecker for KeyProofChecker<F>
where
    F: Fn(&str, &str) -> Result<PublicKey, Error> + Send + Sync,
{
    fn check_jwt_proof(
        &self,
        headers: &Headers,
        payload: &[u8],
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), Error> {
        let algorithm = header_algorithm(headers)?;
        let key_id = headers
            .get(HEADER_KEY_ID)
            .and_then(Value::as_str)
            .ok_or(Error::MissingKeyId)?;
        let claims: crate::jwt::JwtCredClaims = serde_json::from_slice(payload)?;
        let issuer = claims.issuer().ok_or(Error::MissingIssuer)?;
        let public_key = (self.fetcher)(&issuer, key_id)?;
        crate::jws::verify_bytes(algorithm, signing_input, &public_key.to_jwk()?, signature)
    }
}

fn header_algorithm(headers: &Headers) -> Result<Algorithm, Error> {
    let value = headers
        .get(HEADER_ALGORITHM)
        .ok_or_else(|| Error::UnsupportedAlgorithm(Algorithm::None.to_string()))?;
    match serde_json::from_value(value.clone()) {
        Ok(Algorithm::None) | Err(_) => Err(Error::UnsupportedAlgorithm(value.to_string())),
        Ok(algorithm) => Ok(algorithm),
    }
}

/// JWS signer with headers fixed at construction.
pub struct JoseSigner<C> {
    params: SignParameters,
    creator: C,
    headers: Headers,
}

impl<C: ProofCreator> JoseSigner<C> {
    pub fn new(params: SignParameters, creator: C) -> Result<Self, Error> {
        let headers = creator.create_jwt_headers(&params)?;
        if !headers.contains_key(HEADER_ALGORITHM) {
            return Err(Error::UnsupportedAlgorithm(Algorithm::None.to_string()));
        }
        Ok(Self {
            params,
            creator,
            headers,
        })
    }

    /// Headers computed when the signer was built.
    pub fn jose_headers(&self) -> &Headers {
        &self.headers
    }
}

impl<C: ProofCreator> JwsSigner for JoseSigner<C> {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.creator.sign_jwt(&self.params, data)
    }

    fn headers(&self) -> BTreeMap<String, Value> {
        self.headers.clone()
    }
}

/// JWS verifier delegating to a [`ProofChecker`].
pub struct JoseVerifier<C> {
    checker: C,
}

impl<C: ProofChecker> JoseVerifier<C> {
    pub fn new(checker: C) -> Self {
        Self { checker }
    }
}

impl<C: ProofChecker> JwsVerifier for JoseVerifier<C> {
    fn verify(
        &self,
        headers: &BTreeMap<String, Value>,
        payload: &[u8],
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), Error> {
        self.checker
            .check_jwt_proof(headers, payload, signing_input, signature)
    }
}
