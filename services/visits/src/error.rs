//! Custom error types for visit operations

use common::PlatformError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{VisitAction, VisitStatus};

/// Custom error type for visit operations
#[derive(Error, Debug)]
pub enum VisitsError {
    /// Form input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    #[error("Host not found with email: {0}")]
    HostNotFound(String),

    #[error("Visit {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    Forbidden(String),

    /// The lifecycle does not allow `action` from `from`
    #[error("Cannot {action} a visit that is {from}")]
    InvalidTransition {
        from: VisitStatus,
        action: VisitAction,
    },

    /// The row's status moved on between reading and updating it
    #[error("Visit {0} was updated by someone else, reload and try again")]
    StatusChanged(Uuid),

    #[error("Photo upload failed: {0}")]
    PhotoUpload(String),

    #[error("Failed to generate QR code: {0}")]
    Qr(String),

    #[error("Email notification failed: {0}")]
    Email(String),

    #[error("Email notification is not configured")]
    EmailDisabled,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Type alias for visit results
pub type VisitsResult<T> = Result<T, VisitsError>;
