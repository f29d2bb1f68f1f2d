//! Identity provider seam over the platform's session API

use async_trait::async_trait;
use common::PlatformClient;
use common::PlatformResult;
use common::identity::{AuthSession, AuthUser};
use mockall::automock;

/// Credential exchange with the identity service
#[automock]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> PlatformResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> PlatformResult<AuthSession>;

    async fn refresh(&self, refresh_token: &str) -> PlatformResult<AuthSession>;

    async fn sign_out(&self, access_token: &str) -> PlatformResult<()>;

    /// Authenticate subsequent data requests as this session (or anonymously)
    fn set_access_token(&self, token: Option<String>);
}

/// `IdentityProvider` backed by the platform client
///
/// The client is shared with the repositories, so switching its access token
/// here changes which account row-level security evaluates.
#[derive(Clone, Debug)]
pub struct PlatformIdentity {
    client: PlatformClient,
}

impl PlatformIdentity {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityProvider for PlatformIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> PlatformResult<AuthUser> {
        self.client.sign_up(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> PlatformResult<AuthSession> {
        self.client.sign_in_with_password(email, password).await
    }

    async fn refresh(&self, refresh_token: &str) -> PlatformResult<AuthSession> {
        self.client.refresh_session(refresh_token).await
    }

    async fn sign_out(&self, access_token: &str) -> PlatformResult<()> {
        self.client.sign_out(access_token).await
    }

    fn set_access_token(&self, token: Option<String>) {
        self.client.set_access_token(token);
    }
}
