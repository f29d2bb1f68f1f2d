//! Authentication store
//!
//! `AuthStore` is the single source of truth for who is signed in. Every
//! operation updates the observable `AuthState` (loading flag, current user,
//! last error) in addition to returning its result, so front-ends can either
//! await the call or watch the state.

use chrono::Utc;
use common::identity::AuthSession;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::{Host, NewHost, Role};
use crate::provider::IdentityProvider;
use crate::repositories::HostsRepository;
use crate::session::SessionStore;
use crate::token;
use crate::validation::{SignupForm, validate_signup};

/// Observable authentication state
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<Host>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }
}

pub struct AuthStore {
    identity: Arc<dyn IdentityProvider>,
    hosts: Arc<dyn HostsRepository>,
    sessions: Arc<dyn SessionStore>,
    session: Mutex<Option<AuthSession>>,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        hosts: Arc<dyn HostsRepository>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            identity,
            hosts,
            sessions,
            session: Mutex::new(None),
            state,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<Host> {
        self.state.borrow().user.clone()
    }

    /// Restore the persisted session, refreshing it when close to expiry
    pub async fn initialize(&self) -> AuthResult<Option<Host>> {
        info!("Checking authentication...");

        match self.restore().await {
            Ok(Some(host)) => {
                info!("Session restored for {}", host.email);
                self.set_signed_in(host.clone());
                Ok(Some(host))
            }
            Ok(None) => {
                self.state.send_modify(|state| {
                    state.user = None;
                    state.is_authenticated = false;
                    state.is_loading = false;
                });
                Ok(None)
            }
            Err(e) => {
                error!("Authentication initialization failed: {}", e);
                self.drop_local_session().await;
                self.set_failed(&e);
                Err(e)
            }
        }
    }

    async fn restore(&self) -> AuthResult<Option<Host>> {
        let Some(mut session) = self.sessions.load()? else {
            return Ok(None);
        };

        if token::needs_refresh(&session, Utc::now()) {
            info!("Access token for {} is expiring, refreshing", session.user.email);
            session = self.identity.refresh(&session.refresh_token).await?;
            self.sessions.save(&session)?;
        }

        self.identity
            .set_access_token(Some(session.access_token.clone()));
        let host = self.load_profile(session.user.id).await?;
        *self.session.lock().await = Some(session);
        Ok(Some(host))
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Host> {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        match self.sign_in(email.trim(), password).await {
            Ok(host) => {
                info!("User logged in: {}", host.email);
                self.set_signed_in(host.clone());
                Ok(host)
            }
            Err(e) => {
                error!("Login failed: {}", e);
                self.drop_local_session().await;
                self.set_failed(&e);
                Err(e)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Host> {
        let session = self
            .identity
            .sign_in(email, password)
            .await
            .map_err(AuthError::from_sign_in)?;

        self.identity
            .set_access_token(Some(session.access_token.clone()));
        let host = self.load_profile(session.user.id).await?;

        self.sessions.save(&session)?;
        *self.session.lock().await = Some(session);
        Ok(host)
    }

    /// Create an account with role `host`; the new account is not signed in
    pub async fn signup(&self, form: &SignupForm) -> AuthResult<Host> {
        self.state.send_modify(|state| state.error = None);

        let result = self.create_account(form).await;
        if let Err(e) = &result {
            error!("Signup failed: {}", e);
            let message = e.to_string();
            self.state.send_modify(|state| state.error = Some(message));
        }
        result
    }

    async fn create_account(&self, form: &SignupForm) -> AuthResult<Host> {
        let department_id = validate_signup(form).map_err(AuthError::Validation)?;
        let email = form.email.trim();

        let identity = self.identity.sign_up(email, &form.password).await?;
        let host = self
            .hosts
            .create(&NewHost {
                auth_id: identity.id,
                name: form.name.trim().to_string(),
                email: email.to_string(),
                department_id,
                role: Role::Host,
            })
            .await?;

        info!("Account created for {}", host.email);
        Ok(host)
    }

    /// Sign out remotely and forget the session locally
    ///
    /// Local state is cleared even when the remote sign-out fails.
    pub async fn logout(&self) -> AuthResult<()> {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let session = self.session.lock().await.take();
        let remote = match &session {
            Some(session) => self.identity.sign_out(&session.access_token).await,
            None => Ok(()),
        };

        self.identity.set_access_token(None);
        let local = self.sessions.clear();

        let failed = remote.is_err() || local.is_err();
        if let Err(e) = &remote {
            error!("Logout failed: {}", e);
        }
        if let Err(e) = &local {
            error!("Failed to remove persisted session: {}", e);
        }

        self.state.send_modify(|state| {
            state.user = None;
            state.is_authenticated = false;
            state.is_loading = false;
            state.error = failed.then(|| AuthError::Logout.to_string());
        });

        if failed {
            return Err(AuthError::Logout);
        }
        info!("User logged out");
        Ok(())
    }

    async fn load_profile(&self, auth_id: Uuid) -> AuthResult<Host> {
        let host = self
            .hosts
            .find_by_auth_id(auth_id)
            .await?
            .ok_or(AuthError::ProfileNotFound)?;

        if !host.role.is_supported() {
            return Err(AuthError::UnsupportedRole);
        }
        Ok(host)
    }

    async fn drop_local_session(&self) {
        self.identity.set_access_token(None);
        *self.session.lock().await = None;
        if let Err(e) = self.sessions.clear() {
            error!("Failed to remove persisted session: {}", e);
        }
    }

    fn set_signed_in(&self, host: Host) {
        self.state.send_replace(AuthState {
            user: Some(host),
            is_authenticated: true,
            is_loading: false,
            error: None,
        });
    }

    fn set_failed(&self, err: &AuthError) {
        self.state.send_replace(AuthState {
            user: None,
            is_authenticated: false,
            is_loading: false,
            error: Some(err.to_string()),
        });
    }
}
