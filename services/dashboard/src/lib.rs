//! Visit statistics for the signed-in user
//!
//! Counts are taken over the current local day and scoped by role. The
//! watcher keeps them current from a poll schedule and the realtime feed.

pub mod error;
pub mod stats;
pub mod watcher;
pub mod window;

pub use error::{DashboardError, DashboardResult};
pub use stats::{DashboardStats, StatCard, StatsService};
pub use watcher::{DashboardSnapshot, DashboardWatcher};
pub use window::DayWindow;
