use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::verification_method::VerificationMethod;

pub const ASSERTION_METHOD: &str = "assertionMethod";
pub const AUTHENTICATION: &str = "authentication";

/// Proof embedding kind.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofType {
    /// Data Integrity proof carrying a `cryptosuite` and a multibase
    /// `proofValue`.
    DataIntegrityProof,
    /// Linked Data proof carrying a detached JWS.
    JsonWebSignature2020,
}

impl ProofType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DataIntegrityProof => "DataIntegrityProof",
            Self::JsonWebSignature2020 => "JsonWebSignature2020",
        }
    }
}

/// Parameters of a single proof creation or verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOptions {
    /// Key used to sign, or to check the signature.
    pub verification_method: VerificationMethod,
    /// Identifier expected in the proof's `verificationMethod`.
    pub verification_method_id: String,
    pub suite_type: String,
    pub purpose: String,
    pub proof_type: ProofType,
    /// Signing time. Defaults to the current time when creating a proof.
    pub created: Option<DateTime<Utc>>,
    /// Maximum proof age accepted at verification time. `None` or zero
    /// disables the check.
    pub max_age: Option<Duration>,
    pub domain: Option<String>,
    pub challenge: Option<String>,
}

impl ProofOptions {
    pub fn new(verification_method: VerificationMethod, suite_type: impl Into<String>) -> Self {
        Self {
            verification_method_id: verification_method.id.clone(),
            verification_method,
            suite_type: suite_type.into(),
            purpose: ASSERTION_METHOD.to_string(),
            proof_type: ProofType::DataIntegrityProof,
            created: None,
            max_age: None,
            domain: None,
            challenge: None,
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn with_proof_type(mut self, proof_type: ProofType) -> Self {
        self.proof_type = proof_type;
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }

    /// Checks that `verification_method_id` names `verification_method`.
    pub fn validate(&self) -> Result<(), Error> {
        if self.verification_method_id.is_empty() {
            return Err(Error::MissingVerificationMethod);
        }
        if self.verification_method_id != self.verification_method.id {
            return Err(Error::InvalidProofOptions(format!(
                "verification method id `{}` does not match method `{}`",
                self.verification_method_id, self.verification_method.id
            )));
        }
        if self.suite_type.is_empty() {
            return Err(Error::InvalidProofOptions("empty suite type".to_string()));
        }
        Ok(())
    }

    /// Whether a proof created at `created` is too old at `now`.
    pub fn is_expired(&self, created: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.max_age {
            Some(max_age) if !max_age.is_zero() => now - created > max_age,
            _ => false,
        }
    }
}

/// A Data Integrity proof.
///
/// The signature lives in `proof_value` (multibase) or `jws` (detached
/// compact JWS) depending on the suite. Everything else is the proof
/// skeleton, covered by the signature. Unknown members are rejected since
/// they would not be signed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Proof {
    #[serde(rename = "type")]
    pub type_: ProofType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,
    pub verification_method: String,
    pub proof_purpose: String,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,
}

impl Proof {
    /// The proof without its signature.
    pub fn skeleton(&self) -> Proof {
        Proof {
            proof_value: None,
            jws: None,
            ..self.clone()
        }
    }

    pub fn is_signed(&self) -> bool {
        self.proof_value.is_some() || self.jws.is_some()
    }

    /// Decoded multibase `proofValue`.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, Error> {
        let proof_value = self
            .proof_value
            .as_ref()
            .ok_or(Error::MissingProofSignature)?;
        Ok(multibase::decode(proof_value)?.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn method(id: &str) -> VerificationMethod {
        VerificationMethod {
            id: id.to_string(),
            type_: "JsonWebKey2020".to_string(),
            controller: "did:foo:bar".to_string(),
            public_key_jwk: None,
            public_key_multibase: Some("z6Mk".to_string()),
        }
    }

    #[test]
    fn mismatched_method_id_rejected() {
        let mut options = ProofOptions::new(method("#key-1"), "ecdsa-2019");
        options.validate().unwrap();
        options.verification_method_id = "#key-2".to_string();
        assert!(matches!(
            options.validate(),
            Err(Error::InvalidProofOptions(_))
        ));
    }

    #[test]
    fn empty_method_id_rejected() {
        let options = ProofOptions::new(method(""), "ecdsa-2019");
        assert!(matches!(
            options.validate(),
            Err(Error::MissingVerificationMethod)
        ));
    }

    #[test]
    fn max_age_boundaries() {
        let created = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let options =
            ProofOptions::new(method("#key-1"), "ecdsa-2019").with_max_age(Duration::seconds(100));
        assert!(!options.is_expired(created, created + Duration::seconds(99)));
        assert!(options.is_expired(created, created + Duration::seconds(101)));

        let no_limit = options.clone().with_max_age(Duration::zero());
        assert!(!no_limit.is_expired(created, created + Duration::days(365)));
    }

    #[test]
    fn proof_wire_format() {
        let proof_value = multibase::encode(multibase::Base::Base58Btc, [7u8; 64]);
        let proof: Proof = serde_json::from_value(json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "ecdsa-2019",
            "verificationMethod": "did:foo:bar#key-1",
            "proofPurpose": "assertionMethod",
            "created": "2023-01-01T00:00:00Z",
            "proofValue": proof_value
        }))
        .unwrap();
        assert!(proof.is_signed());
        assert!(!proof.skeleton().is_signed());
        assert_eq!(proof.signature_bytes().unwrap().len(), 64);

        let value = serde_json::to_value(proof.skeleton()).unwrap();
        assert!(value.get("proofValue").is_none());
        assert_eq!(value["created"], "2023-01-01T00:00:00Z");
    }

    #[test]
    fn unknown_proof_member_rejected() {
        let result = serde_json::from_value::<Proof>(json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-2022",
            "verificationMethod": "did:foo:bar#key-1",
            "proofPurpose": "assertionMethod",
            "created": "2023-01-01T00:00:00Z",
            "proofValue": "z3FXQ",
            "extra": "unsigned"
        }));
        assert!(result.is_err());
    }
}
