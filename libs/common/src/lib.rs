//! Common library for the visitor desk
//!
//! This crate provides the pieces every other crate in the workspace builds
//! on: configuration loading, the platform error taxonomy, tracing setup and
//! the data client for the managed backend (tables, object storage, sessions
//! and realtime change notifications).

pub mod config;
pub mod error;
pub mod identity;
pub mod platform;
pub mod query;
pub mod realtime;
pub mod storage;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{PlatformError, PlatformResult};
pub use platform::PlatformClient;
pub use query::{Order, Query};

/// Example usage of the platform client
///
/// ```rust,no_run
/// use common::{AppConfig, PlatformClient, Query};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = AppConfig::from_env()?;
///     let client = PlatformClient::new(&config.platform)?;
///     let is_healthy = client.health_check().await?;
///     println!("Platform health check: {}", is_healthy);
///
///     let pending: Vec<serde_json::Value> = client
///         .fetch_all(&Query::table("visits").eq("status", "pending"))
///         .await?;
///     println!("{} pending visits", pending.len());
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
