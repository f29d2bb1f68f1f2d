//! Authentication for the visitor desk
//!
//! Sign-in, sign-up and sign-out against the platform's identity service,
//! the host profile that goes with each account, persistence of the session
//! between runs, and user management for administrators.

pub mod accounts;
pub mod error;
pub mod models;
pub mod provider;
pub mod repositories;
pub mod session;
pub mod store;
pub mod token;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use models::{Department, Host, NewHost, Role};
pub use store::{AuthState, AuthStore};
