//! Token issuance and verification
//!
//! Credentials are HS256 JWTs carrying `{ user: { id }, iat, exp }`. Nothing
//! is persisted server-side: a credential is valid iff its signature checks
//! out under the process key and `exp` is still in the future.
//!
//! # Performance
//!
//! The HMAC keys are derived once at startup and shared through `Arc`, so
//! cloning an issuer or verifier into request handlers is O(1).

use super::AuthUser;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Identity section of the token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: String,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject. Optional on the way in so a payload without it is reported
    /// as malformed rather than as a decoding failure.
    #[serde(default)]
    pub user: Option<TokenUser>,
    /// Issued at (Unix timestamp, seconds)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

/// Issuer failures. Only a missing or unusable key can cause one, which is
/// checked when the keys are built at startup.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("failed to sign token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Why a presented credential was refused.
///
/// Clients only ever see the guard's generic message; these variants are for
/// logs and metrics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("missing token")]
    MissingToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed payload")]
    MalformedPayload,
}

impl VerificationError {
    /// Short label for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::MalformedPayload => "malformed_payload",
        }
    }
}

/// Pre-computed HMAC keys derived from the process secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Derive keys from the configured secret. Call once at startup.
    pub fn new(secret: &SecretString) -> Result<Self, SigningError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(SigningError::MissingSecret);
        }

        Ok(Self {
            encoding: Arc::new(EncodingKey::from_secret(bytes)),
            decoding: Arc::new(DecodingKey::from_secret(bytes)),
        })
    }
}

/// Mints credentials for authenticated users
#[derive(Clone)]
pub struct TokenIssuer {
    keys: JwtKeys,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(keys: JwtKeys, ttl_secs: i64) -> Self {
        Self { keys, ttl_secs }
    }

    /// Issue a credential for `user_id`, valid for the configured TTL
    #[inline]
    pub fn issue(&self, user_id: Uuid) -> Result<String, SigningError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a credential as if the current time were `now`
    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, SigningError> {
        let exp = now + Duration::seconds(self.ttl_secs);

        let claims = Claims {
            user: Some(TokenUser {
                id: user_id.to_string(),
            }),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?)
    }

    /// Credential lifetime in seconds
    #[inline]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }
}

/// Validates presented credentials. Pure: no I/O, no shared mutable state.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: JwtKeys,
    validation: Arc<Validation>,
}

impl TokenVerifier {
    pub fn new(keys: JwtKeys) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            keys,
            validation: Arc::new(validation),
        }
    }

    /// Check signature, then expiry, then subject
    pub fn verify(&self, token: &str) -> Result<AuthUser, VerificationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VerificationError::MissingToken);
        }

        // A header that does not decode is structural corruption; any later
        // JSON failure can only come from a payload that was correctly signed.
        decode_header(token).map_err(|_| VerificationError::InvalidSignature)?;

        let data = decode::<Claims>(token, &self.keys.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => {
                    VerificationError::MalformedPayload
                }
                _ => VerificationError::InvalidSignature,
            },
        )?;

        let user_id = data
            .claims
            .user
            .and_then(|u| Uuid::parse_str(&u.id).ok())
            .ok_or(VerificationError::MalformedPayload)?;

        Ok(AuthUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TOKEN_TTL_SECS;
    use proptest::prelude::*;
    use secrecy::Secret;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&Secret::new(secret.to_string())).unwrap()
    }

    fn create_test_pair(secret: &str) -> (TokenIssuer, TokenVerifier) {
        let keys = keys(secret);
        (
            TokenIssuer::new(keys.clone(), DEFAULT_TOKEN_TTL_SECS),
            TokenVerifier::new(keys),
        )
    }

    fn sign_raw(secret: &str, payload: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let (issuer, verifier) = create_test_pair("test-secret");
        let user_id = Uuid::new_v4();

        let token = issuer.issue(user_id).unwrap();
        let identity = verifier.verify(&token).unwrap();

        assert_eq!(identity.user_id, user_id);
    }

    #[test]
    fn test_payload_shape_and_ttl() {
        let (issuer, _) = create_test_pair("test-secret");
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let token = issuer.issue_at(user_id, now).unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        let claims =
            decode::<serde_json::Value>(&token, &DecodingKey::from_secret(&[]), &validation)
                .unwrap()
                .claims;

        assert_eq!(claims["user"]["id"], user_id.to_string());
        assert_eq!(claims["iat"], now.timestamp());
        assert_eq!(claims["exp"], now.timestamp() + 360_000);
    }

    #[test]
    fn test_empty_token_is_missing() {
        let (_, verifier) = create_test_pair("test-secret");
        assert_eq!(verifier.verify(""), Err(VerificationError::MissingToken));
        assert_eq!(verifier.verify("   "), Err(VerificationError::MissingToken));
    }

    #[test]
    fn test_token_from_other_key_has_invalid_signature() {
        let (issuer, _) = create_test_pair("secret-one");
        let (_, verifier) = create_test_pair("secret-two");

        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert_eq!(verifier.verify(&token), Err(VerificationError::InvalidSignature));
    }

    #[test]
    fn test_garbage_has_invalid_signature() {
        let (_, verifier) = create_test_pair("test-secret");
        assert_eq!(
            verifier.verify("invalid.token.here"),
            Err(VerificationError::InvalidSignature)
        );
        assert_eq!(
            verifier.verify("not-a-jwt"),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_has_invalid_signature() {
        let (issuer, verifier) = create_test_pair("test-secret");
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        let other = issuer.issue(Uuid::new_v4()).unwrap();

        // Splice the payload of one token onto the signature of another
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(verifier.verify(&forged), Err(VerificationError::InvalidSignature));
    }

    #[test]
    fn test_token_past_ttl_is_expired() {
        let (issuer, verifier) = create_test_pair("test-secret");
        let issued = Utc::now() - Duration::seconds(DEFAULT_TOKEN_TTL_SECS + 1);

        let token = issuer.issue_at(Uuid::new_v4(), issued).unwrap();
        assert_eq!(verifier.verify(&token), Err(VerificationError::Expired));
    }

    #[test]
    fn test_expiry_checked_before_subject() {
        let payload = serde_json::json!({ "iat": 1, "exp": 2 });
        let token = sign_raw("test-secret", &payload);
        let (_, verifier) = create_test_pair("test-secret");

        assert_eq!(verifier.verify(&token), Err(VerificationError::Expired));
    }

    #[test]
    fn test_missing_subject_is_malformed() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let (_, verifier) = create_test_pair("test-secret");

        let no_user = sign_raw("test-secret", &serde_json::json!({ "exp": exp }));
        assert_eq!(verifier.verify(&no_user), Err(VerificationError::MalformedPayload));

        let bad_id = sign_raw(
            "test-secret",
            &serde_json::json!({ "user": { "id": "507f1f77bcf86cd799439011" }, "exp": exp }),
        );
        assert_eq!(verifier.verify(&bad_id), Err(VerificationError::MalformedPayload));
    }

    #[test]
    fn test_missing_expiry_is_malformed() {
        let payload = serde_json::json!({ "user": { "id": Uuid::new_v4().to_string() } });
        let token = sign_raw("test-secret", &payload);
        let (_, verifier) = create_test_pair("test-secret");

        assert_eq!(verifier.verify(&token), Err(VerificationError::MalformedPayload));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = JwtKeys::new(&Secret::new(String::new()));
        assert!(matches!(result, Err(SigningError::MissingSecret)));
    }

    #[test]
    fn test_issuer_is_clone_cheap() {
        let (issuer, verifier) = create_test_pair("test-secret");
        let _issuer = issuer.clone();
        let _verifier = verifier.clone();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_round_trip_preserves_subject(bytes in any::<[u8; 16]>()) {
            let (issuer, verifier) = create_test_pair("prop-secret");
            let user_id = Uuid::from_bytes(bytes);

            let token = issuer.issue(user_id).unwrap();
            prop_assert_eq!(verifier.verify(&token).unwrap().user_id, user_id);
        }
    }
}
