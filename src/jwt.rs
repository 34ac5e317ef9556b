use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jose::{Headers, JoseVerifier, KeyProofChecker};
use crate::jwk::{Algorithm, JWK};
use crate::jws::{self, JwsSigner, JwsVerifier};
use crate::verification_method::PublicKey;

// RFC 7519 - JSON Web Token (JWT)
// https://www.w3.org/TR/vc-data-model/#jwt-encoding

/// JWT claim set of a credential encoded as a JWS.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct JwtCredClaims {
    #[serde(rename = "iss")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(rename = "sub")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "jti")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_id: Option<String>,
    #[serde(rename = "nbf")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<i64>,
    #[serde(rename = "iat")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    #[serde(rename = "exp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    #[serde(rename = "vc")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifiable_credential: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub additional_claims: Map<String, Value>,
}

impl JwtCredClaims {
    /// Claims for `credential`, copying its identifiers and dates into the
    /// registered claims. The credential is embedded unchanged under `vc`.
    pub fn from_credential(credential: &Value) -> Result<Self, Error> {
        let vc = match credential {
            Value::Object(map) => map,
            _ => return Err(Error::MissingCredential),
        };
        let issuer = match vc.get("issuer") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Object(issuer)) => issuer.get("id").and_then(Value::as_str).map(Into::into),
            _ => None,
        };
        let subject = match vc.get("credentialSubject") {
            Some(Value::Object(subject)) => {
                subject.get("id").and_then(Value::as_str).map(Into::into)
            }
            _ => None,
        };
        let issuance_date = vc
            .get("issuanceDate")
            .or_else(|| vc.get("validFrom"))
            .map(numeric_date)
            .transpose()?;
        let expiration_time = vc
            .get("expirationDate")
            .or_else(|| vc.get("validUntil"))
            .map(numeric_date)
            .transpose()?;
        Ok(Self {
            issuer,
            subject,
            jwt_id: vc.get("id").and_then(Value::as_str).map(Into::into),
            not_before: issuance_date,
            issued_at: issuance_date,
            expiration_time,
            verifiable_credential: Some(vc.clone()),
            additional_claims: Map::new(),
        })
    }

    /// Issuer of the credential: `iss`, or the embedded credential's
    /// `issuer` (a string or an object with an `id`).
    pub fn issuer(&self) -> Option<String> {
        if let Some(issuer) = &self.issuer {
            return Some(issuer.clone());
        }
        match self.verifiable_credential.as_ref()?.get("issuer")? {
            Value::String(id) => Some(id.clone()),
            Value::Object(issuer) => issuer.get("id")?.as_str().map(Into::into),
            _ => None,
        }
    }

    /// The embedded credential with `iss`, `jti` and `exp` folded back in.
    pub fn into_credential(self) -> Result<Value, Error> {
        let mut vc = self.verifiable_credential.ok_or(Error::MissingCredential)?;
        if let Some(issuer) = self.issuer {
            match vc.get_mut("issuer") {
                Some(Value::Object(object)) => {
                    object.insert("id".to_string(), Value::String(issuer));
                }
                _ => {
                    vc.insert("issuer".to_string(), Value::String(issuer));
                }
            }
        }
        if let Some(id) = self.jwt_id {
            vc.insert("id".to_string(), Value::String(id));
        }
        if let Some(exp) = self.expiration_time {
            vc.insert("expirationDate".to_string(), Value::String(date_time(exp)?));
        }
        if !vc.contains_key("issuanceDate") && !vc.contains_key("validFrom") {
            if let Some(nbf) = self.issued_at.or(self.not_before) {
                vc.insert("issuanceDate".to_string(), Value::String(date_time(nbf)?));
            }
        }
        Ok(Value::Object(vc))
    }
}

fn numeric_date(value: &Value) -> Result<i64, Error> {
    let date = value.as_str().ok_or(Error::InvalidJws)?;
    Ok(DateTime::parse_from_rfc3339(date)?.timestamp())
}

fn date_time(timestamp: i64) -> Result<String, Error> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|date| date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .ok_or(Error::InvalidJws)
}

pub fn encode_sign<Claims: Serialize>(
    algorithm: Algorithm,
    claims: &Claims,
    key: &JWK,
) -> Result<String, Error> {
    let payload = serde_json::to_string(claims)?;
    jws::encode_sign(algorithm, &payload, key)
}

pub fn decode_unverified<Claims: DeserializeOwned>(jwt: &str) -> Result<Claims, Error> {
    let (_header, payload) = jws::decode_unverified(jwt)?;
    let claims = serde_json::from_slice(&payload)?;
    Ok(claims)
}

/// Serializes `claims` as a compact JWS signed by `signer`.
pub fn encode_cred_jws(claims: &JwtCredClaims, signer: &dyn JwsSigner) -> Result<String, Error> {
    let payload = serde_json::to_vec(claims)?;
    jws::encode_with_signer(&payload, signer)
}

/// Decodes and verifies a credential JWS.
///
/// The verification key is resolved with `key_fetcher(issuer, kid)`. On
/// success, returns the JOSE headers and the serialized `vc` claim. Every
/// failure is reported as [`Error::MalformedJws`].
pub fn decode_cred_jws<F>(
    token: &str,
    allow_custom_headers: bool,
    key_fetcher: F,
) -> Result<(Headers, Vec<u8>), Error>
where
    F: Fn(&str, &str) -> Result<PublicKey, Error> + Send + Sync,
{
    decode_checked(token, allow_custom_headers, key_fetcher).map_err(|e| {
        log::warn!("rejecting credential JWS: {e}");
        Error::malformed_jws(e)
    })
}

fn decode_checked<F>(
    token: &str,
    allow_custom_headers: bool,
    key_fetcher: F,
) -> Result<(Headers, Vec<u8>), Error>
where
    F: Fn(&str, &str) -> Result<PublicKey, Error> + Send + Sync,
{
    let (header_b64, payload_enc, signature_b64) = jws::split_jws(token)?;
    let decoded = jws::decode_jws_parts(header_b64, payload_enc.as_bytes(), signature_b64)?;
    let headers = decoded.header_map()?;
    if !allow_custom_headers {
        if let Some(name) = headers
            .keys()
            .find(|name| !jws::REGISTERED_HEADERS.contains(&name.as_str()))
        {
            return Err(Error::UnexpectedHeader(name.clone()));
        }
    }
    let claims: JwtCredClaims = serde_json::from_slice(&decoded.payload)?;
    let credential = claims
        .verifiable_credential
        .as_ref()
        .ok_or(Error::MissingCredential)?;

    JoseVerifier::new(KeyProofChecker::new(key_fetcher)).verify(
        &headers,
        &decoded.payload,
        &decoded.signing_input,
        &decoded.signature,
    )?;
    Ok((headers, serde_json::to_vec(credential)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credential() -> Value {
        json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "id": "http://example.edu/credentials/1872",
            "type": ["VerifiableCredential"],
            "issuer": {"id": "did:example:issuer", "name": "Example University"},
            "issuanceDate": "2010-01-01T19:23:24Z",
            "expirationDate": "2030-01-01T19:23:24Z",
            "credentialSubject": {"id": "did:example:subject"}
        })
    }

    #[test]
    fn claims_from_credential() {
        let claims = JwtCredClaims::from_credential(&credential()).unwrap();
        assert_eq!(claims.issuer.as_deref(), Some("did:example:issuer"));
        assert_eq!(claims.subject.as_deref(), Some("did:example:subject"));
        assert_eq!(
            claims.jwt_id.as_deref(),
            Some("http://example.edu/credentials/1872")
        );
        assert_eq!(claims.not_before, Some(1262373804));
        assert_eq!(claims.expiration_time, Some(1893525804));
        assert_eq!(claims.into_credential().unwrap(), credential());
    }

    #[test]
    fn issuer_falls_back_to_credential() {
        let claims = JwtCredClaims {
            verifiable_credential: Some(
                serde_json::from_value(json!({"issuer": "did:example:a"})).unwrap(),
            ),
            ..Default::default()
        };
        assert_eq!(claims.issuer().as_deref(), Some("did:example:a"));
        assert_eq!(JwtCredClaims::default().issuer(), None);
    }

    #[test]
    fn invalid_date() {
        let mut vc = credential();
        vc["issuanceDate"] = json!("yesterday");
        assert!(matches!(
            JwtCredClaims::from_credential(&vc),
            Err(Error::TimeError(_))
        ));
    }

    #[test]
    #[cfg(feature = "secp256r1")]
    fn custom_headers() {
        use crate::jose::{JoseSigner, KeyProofCreator, SignParameters};

        let key = JWK::generate_p256();
        let public = key.to_public();
        let params = SignParameters::new("did:example:issuer#key-1").with_header("x-tenant", "a");
        let signer = JoseSigner::new(params, KeyProofCreator::from_jwk(key).unwrap()).unwrap();
        let claims = JwtCredClaims::from_credential(&credential()).unwrap();
        let token = encode_cred_jws(&claims, &signer).unwrap();

        let fetcher = |_: &str, _: &str| -> Result<PublicKey, Error> {
            Ok(PublicKey::from_jwk("JsonWebKey2020", public.clone()))
        };
        let err = decode_cred_jws(&token, false, fetcher).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedJws(ref source) if matches!(**source, Error::UnexpectedHeader(_))
        ));
        let (headers, _) = decode_cred_jws(&token, true, fetcher).unwrap();
        assert_eq!(headers["x-tenant"], "a");
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn fetcher_error_is_malformed() {
        let key = JWK::generate_ed25519().with_key_id("did:example:issuer#key-1");
        let claims = JwtCredClaims::from_credential(&credential()).unwrap();
        let token = encode_sign(Algorithm::EdDSA, &claims, &key).unwrap();
        let err = decode_cred_jws(&token, false, |issuer: &str, _: &str| {
            Err(Error::KeyNotFound(issuer.to_string()))
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("unmarshal VC JWT claims"));
    }
}
