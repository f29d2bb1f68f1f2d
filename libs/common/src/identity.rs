//! Session API: sign-up, password sign-in, refresh and sign-out
//!
//! The platform owns credentials. This module only exchanges them for an
//! `AuthSession` and hands the session's tokens back to the caller.

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{PlatformError, PlatformResult};
use crate::platform::PlatformClient;

/// Identity of a signed-in account, as the session API reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: String,
}

/// Tokens for one signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl AuthSession {
    /// True when the access token expires within `margin` of `now`
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at <= now + margin
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up answers with a bare user when confirmation is pending, or with a
/// full session when the project auto-confirms.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: AuthUser },
    User(AuthUser),
}

impl PlatformClient {
    /// Create an identity for `email`; does not sign it in
    pub async fn sign_up(&self, email: &str, password: &str) -> PlatformResult<AuthUser> {
        let builder = self
            .request_as(Method::POST, "/auth/v1/signup", self.anon_key())
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(builder).await?;

        let user = match Self::decode::<SignUpResponse>(response).await? {
            SignUpResponse::Session { user } | SignUpResponse::User(user) => user,
        };
        info!("Identity created for {}", user.email);
        Ok(user)
    }

    /// Exchange email and password for a session
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> PlatformResult<AuthSession> {
        let builder = self
            .request_as(
                Method::POST,
                "/auth/v1/token?grant_type=password",
                self.anon_key(),
            )
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(builder).await?;
        let token: TokenResponse = Self::decode(response).await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Exchange a refresh token for a new session
    pub async fn refresh_session(&self, refresh_token: &str) -> PlatformResult<AuthSession> {
        if refresh_token.is_empty() {
            return Err(PlatformError::Configuration(
                "Session has no refresh token".to_string(),
            ));
        }

        let builder = self
            .request_as(
                Method::POST,
                "/auth/v1/token?grant_type=refresh_token",
                self.anon_key(),
            )
            .json(&json!({ "refresh_token": refresh_token }));
        let response = self.send(builder).await?;
        let token: TokenResponse = Self::decode(response).await?;
        info!("Session refreshed for {}", token.user.email);
        Ok(token.into_session(Utc::now()))
    }

    /// The account an access token belongs to
    pub async fn get_user(&self, access_token: &str) -> PlatformResult<AuthUser> {
        let builder = self.request_as(Method::GET, "/auth/v1/user", access_token);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// Revoke the session behind `access_token`
    pub async fn sign_out(&self, access_token: &str) -> PlatformResult<()> {
        let builder = self.request_as(Method::POST, "/auth/v1/logout", access_token);
        self.send(builder).await?;
        Ok(())
    }
}
