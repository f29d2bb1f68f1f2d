//! Application configuration
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional `vms.toml` next to the working directory, then environment
//! variables prefixed with `VMS_` (nested keys separated by `__`, for example
//! `VMS_PLATFORM__ANON_KEY`).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PlatformError, PlatformResult};

/// Default EmailJS-compatible send endpoint
pub const DEFAULT_EMAIL_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Full application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub platform: PlatformConfig,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    pub session: SessionConfig,
    pub dashboard: DashboardConfig,
    pub display: DisplayConfig,
}

/// Connection settings for the managed backend
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Project URL, e.g. `https://xyz.example.co`
    pub url: String,
    /// Public anonymous API key
    pub anon_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding visitor photos
    pub photo_bucket: String,
}

/// Transactional email settings
///
/// Notification is disabled unless all three identifiers are configured.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub endpoint: String,
    /// Send request timeout in seconds
    pub timeout_secs: u64,
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
}

/// Resolved email identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    pub endpoint: String,
    pub timeout: Duration,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// File the signed-in session is persisted to
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Cron schedule (with seconds) for statistics polling
    pub poll_schedule: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Cron schedule (with seconds) for the public display board
    pub refresh_schedule: String,
}

impl AppConfig {
    /// Load configuration from defaults and environment variables only
    pub fn from_env() -> PlatformResult<Self> {
        Self::load(None)
    }

    /// Load configuration, optionally reading a settings file first
    ///
    /// # Environment Variables
    /// - `VMS_PLATFORM__URL`: project URL (required)
    /// - `VMS_PLATFORM__ANON_KEY`: anonymous API key (required)
    /// - `VMS_PLATFORM__TIMEOUT_SECS`: request timeout (default: 30)
    /// - `VMS_STORAGE__PHOTO_BUCKET`: photo bucket (default: "visitor-photos")
    /// - `VMS_EMAIL__SERVICE_ID`, `VMS_EMAIL__TEMPLATE_ID`, `VMS_EMAIL__PUBLIC_KEY`
    /// - `VMS_EMAIL__TIMEOUT_SECS`: mail request timeout (default: 30)
    /// - `VMS_SESSION__PATH`: session file (default: ".vms/session.json")
    /// - `VMS_DASHBOARD__POLL_SCHEDULE`: cron schedule (default: every 30 seconds)
    /// - `VMS_DISPLAY__REFRESH_SCHEDULE`: cron schedule (default: every minute)
    pub fn load(file: Option<&Path>) -> PlatformResult<Self> {
        let builder = Config::builder()
            .set_default("platform.url", "")
            .and_then(|b| b.set_default("platform.anon_key", ""))
            .and_then(|b| b.set_default("platform.timeout_secs", 30))
            .and_then(|b| b.set_default("storage.photo_bucket", "visitor-photos"))
            .and_then(|b| b.set_default("email.endpoint", DEFAULT_EMAIL_ENDPOINT))
            .and_then(|b| b.set_default("email.timeout_secs", 30))
            .and_then(|b| b.set_default("session.path", ".vms/session.json"))
            .and_then(|b| b.set_default("dashboard.poll_schedule", "0/30 * * * * *"))
            .and_then(|b| b.set_default("display.refresh_schedule", "0 * * * * *"))
            .map_err(config_error)?;

        let builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("vms").required(false)),
        };

        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix("VMS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize::<AppConfig>())
            .map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot start with
    pub fn validate(&self) -> PlatformResult<()> {
        let url = self.platform.url.trim();
        if url.is_empty() {
            return Err(PlatformError::Configuration(
                "Missing platform URL (VMS_PLATFORM__URL)".to_string(),
            ));
        }

        let parsed = reqwest::Url::parse(url)
            .map_err(|e| PlatformError::Configuration(format!("Invalid platform URL: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(PlatformError::Configuration(format!(
                "Platform URL must be http or https, got {}",
                parsed.scheme()
            )));
        }

        if self.platform.anon_key.trim().is_empty() {
            return Err(PlatformError::Configuration(
                "Missing platform anon key (VMS_PLATFORM__ANON_KEY)".to_string(),
            ));
        }

        Ok(())
    }
}

impl EmailConfig {
    /// All identifiers needed to send, if configured
    pub fn credentials(&self) -> Option<EmailCredentials> {
        let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();

        Some(EmailCredentials {
            endpoint: self.endpoint.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            service_id: non_empty(&self.service_id)?,
            template_id: non_empty(&self.template_id)?,
            public_key: non_empty(&self.public_key)?,
        })
    }
}

fn config_error(err: config::ConfigError) -> PlatformError {
    PlatformError::Configuration(err.to_string())
}
