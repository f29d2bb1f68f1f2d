//! Visitors and visits
//!
//! Registration forms, the approval workflow, visit passes and their email
//! delivery, bulk CSV upload, the public display board and visit logs.

pub mod approval;
pub mod bulk;
pub mod display;
pub mod error;
pub mod logs;
pub mod models;
pub mod notify;
pub mod photos;
pub mod qr;
pub mod registration;
pub mod repositories;

pub use approval::{ActionOutcome, ApprovalService};
pub use bulk::{BulkOutcome, BulkUploadService};
pub use display::{DisplayBoard, DisplayEntry};
pub use error::{VisitsError, VisitsResult};
pub use logs::{LogEntry, VisitLogs};
pub use models::{Visit, VisitAction, VisitDetails, VisitStatus, Visitor};
pub use registration::{RegistrationOutcome, RegistrationService};
