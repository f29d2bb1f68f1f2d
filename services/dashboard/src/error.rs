//! Custom error types for the dashboard

use common::PlatformError;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;
use visits::VisitsError;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("This role is no longer supported")]
    UnsupportedRole,

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),

    #[error(transparent)]
    Visits(#[from] VisitsError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Type alias for dashboard results
pub type DashboardResult<T> = Result<T, DashboardError>;
