use chrono::{DateTime, Duration, Utc};

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No registered suite accepts the requested type.
    #[error("unsupported signature suite `{0}`")]
    UnsupportedSuite(String),

    /// The document or the proof skeleton cannot be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// The key management backend failed to produce a signature.
    #[error("signing failed: {0}")]
    Signing(Box<Error>),

    /// Proof field does not match the expected value.
    #[error("{field} mismatch: expected `{expected}`, found `{found}`")]
    IdentityMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("proof expired: created {created}, max age {max_age}")]
    ProofExpired {
        created: DateTime<Utc>,
        max_age: Duration,
    },

    /// Cryptographic check of a Data Integrity proof failed.
    #[error("failed to verify {suite} DI proof: {source}")]
    ProofVerificationFailed {
        suite: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid signature")]
    InvalidSignature,

    /// Key algorithm is incompatible with the suite.
    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    /// Compact JWS carrying a credential could not be decoded.
    #[error("unmarshal VC JWT claims: {0}")]
    MalformedJws(Box<Error>),

    #[error("invalid proof options: {0}")]
    InvalidProofOptions(String),

    /// Missing curve in JWK
    #[error("Missing curve in JWK")]
    MissingCurve,

    /// Curve not implemented
    #[error("Curve not implemented: '{0}'")]
    CurveNotImplemented(String),

    #[error("Key type not implemented")]
    KeyTypeNotImplemented,

    #[error("Missing private key parameter in JWK")]
    MissingPrivateKey,

    #[error("Missing public key material")]
    MissingPublicKey,

    #[error("Missing modulus in RSA key")]
    MissingModulus,

    #[error("Missing exponent in RSA key")]
    MissingExponent,

    #[error("Missing prime factor in RSA key")]
    MissingPrime,

    /// Algorithm in JWS header does not match JWK
    #[error("Algorithm in JWS header does not match JWK")]
    AlgorithmMismatch,

    #[error("Unsupported algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    #[error("Algorithm `{0}` not implemented")]
    AlgorithmNotImplemented(String),

    #[error("Invalid JWS")]
    InvalidJws,

    /// Invalid `crit` property in JWT header
    #[error("Invalid crit property in JWT header")]
    InvalidCriticalHeader,

    /// Unknown `crit` header name in JWT header
    #[error("Unknown critical header name in JWT header")]
    UnknownCriticalHeader,

    #[error("Unexpected JWS header parameter `{0}`")]
    UnexpectedHeader(String),

    #[error("Missing key identifier")]
    MissingKeyId,

    #[error("Missing issuer")]
    MissingIssuer,

    #[error("Verifiable credential not found in JWT")]
    MissingCredential,

    #[error("Missing proof verificationMethod")]
    MissingVerificationMethod,

    #[error("Missing signature in proof")]
    MissingProofSignature,

    #[error("Expected unencoded JWS header")]
    ExpectedUnencodedHeader,

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid key length")]
    InvalidKeyLength,

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("Unable to convert date/time")]
    TimeError(#[from] chrono::ParseError),

    #[cfg(feature = "rsa")]
    #[error(transparent)]
    Rsa(#[from] rsa::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Multibase(#[from] multibase::Error),

    #[error(transparent)]
    Varint(#[from] unsigned_varint::decode::Error),

    #[error("unexpected codec {0:#x}")]
    UnexpectedCodec(u64),
}

impl Error {
    /// Wraps a cryptographic failure with the name of the suite that
    /// produced it.
    pub fn verification_failed(suite: &'static str, source: Error) -> Self {
        Self::ProofVerificationFailed {
            suite,
            source: Box::new(source),
        }
    }

    pub fn malformed_jws(source: Error) -> Self {
        Self::MalformedJws(Box::new(source))
    }

    pub(crate) fn crypto(e: impl std::fmt::Display) -> Self {
        Self::Crypto(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failure_names_suite() {
        let err = Error::verification_failed("ecdsa-2019", Error::InvalidSignature);
        assert_eq!(
            err.to_string(),
            "failed to verify ecdsa-2019 DI proof: Invalid signature"
        );
    }

    #[test]
    fn malformed_jws_prefix() {
        let err = Error::malformed_jws(Error::InvalidJws);
        assert!(err.to_string().starts_with("unmarshal VC JWT claims"));
    }
}
