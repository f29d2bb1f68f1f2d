//! Access token inspection
//!
//! The platform signs and verifies access tokens. The desk only reads their
//! claims to learn who the token is for and when it stops being accepted, so
//! decoding skips signature and expiry validation.

use chrono::{DateTime, Duration, Utc};
use common::identity::AuthSession;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::AuthResult;

/// Refresh sessions whose access token expires within this many seconds
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Claims of a platform access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Identity ID
    pub sub: Uuid,
    /// Expiration time
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    /// Database role the platform runs queries as (`authenticated`, `anon`)
    #[serde(default)]
    pub role: Option<String>,
}

impl AccessClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Read the claims of `token` without verifying it
pub fn decode_claims(token: &str) -> AuthResult<AccessClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Whether `session` should be refreshed before use
///
/// The token's own `exp` wins over the stored expiry when it can be read.
pub fn needs_refresh(session: &AuthSession, now: DateTime<Utc>) -> bool {
    let expires_at = decode_claims(&session.access_token)
        .ok()
        .and_then(|claims| claims.expires_at())
        .unwrap_or(session.expires_at);

    expires_at <= now + Duration::seconds(REFRESH_MARGIN_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::identity::AuthUser;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(sub: Uuid, exp: i64) -> String {
        let claims = AccessClaims {
            sub,
            exp,
            email: Some("ada@example.com".to_string()),
            role: Some("authenticated".to_string()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"platform-secret"),
        )
        .unwrap()
    }

    fn session(access_token: String, expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token,
            refresh_token: "refresh".to_string(),
            expires_at,
            user: AuthUser {
                id: Uuid::nil(),
                email: "ada@example.com".to_string(),
            },
        }
    }

    #[test]
    fn test_decode_claims_without_secret() {
        let sub = Uuid::new_v4();
        let claims = decode_claims(&token(sub, 1_710_000_000)).unwrap();

        assert_eq!(claims.sub, sub);
        assert_eq!(claims.role.as_deref(), Some("authenticated"));
        assert_eq!(
            claims.expires_at(),
            Some(Utc.timestamp_opt(1_710_000_000, 0).unwrap())
        );
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_claims("not-a-token").is_err());
    }

    #[test]
    fn test_needs_refresh_uses_token_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let far = now + Duration::hours(1);

        let fresh = session(token(Uuid::nil(), far.timestamp()), now);
        assert!(!needs_refresh(&fresh, now));

        let expiring = session(token(Uuid::nil(), (now + Duration::seconds(30)).timestamp()), far);
        assert!(needs_refresh(&expiring, now));
    }

    #[test]
    fn test_needs_refresh_falls_back_to_stored_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();

        assert!(needs_refresh(&session("opaque".to_string(), now), now));
        assert!(!needs_refresh(
            &session("opaque".to_string(), now + Duration::minutes(5)),
            now
        ));
    }
}
