//! Email notification of visit passes

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use common::config::{EmailConfig, EmailCredentials};
use mockall::automock;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{VisitsError, VisitsResult};

/// Template parameters of the visit pass email
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitEmail {
    pub to_name: String,
    pub to_email: String,
    pub qr_code: String,
    pub visit_id: String,
    pub visit_purpose: String,
    pub host_name: String,
    pub valid_until: String,
}

/// Human-readable local time for email bodies
pub fn display_time(instant: &DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_visit_pass(&self, email: &VisitEmail) -> VisitsResult<()>;
}

/// Mailer posting to an EmailJS-compatible REST endpoint
#[derive(Clone, Debug)]
pub struct EmailJsMailer {
    http: reqwest::Client,
    credentials: EmailCredentials,
}

impl EmailJsMailer {
    pub fn new(credentials: EmailCredentials) -> VisitsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(credentials.timeout)
            .build()
            .map_err(|e| VisitsError::Email(e.to_string()))?;

        Ok(Self { http, credentials })
    }

    fn body(&self, email: &VisitEmail) -> serde_json::Value {
        json!({
            "service_id": self.credentials.service_id,
            "template_id": self.credentials.template_id,
            "user_id": self.credentials.public_key,
            "template_params": email,
        })
    }
}

#[async_trait]
impl Mailer for EmailJsMailer {
    async fn send_visit_pass(&self, email: &VisitEmail) -> VisitsResult<()> {
        let response = self
            .http
            .post(&self.credentials.endpoint)
            .json(&self.body(email))
            .send()
            .await
            .map_err(|e| VisitsError::Email(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisitsError::Email(format!("{}: {}", status, body.trim())));
        }

        info!("Visit pass emailed to {}", email.to_email);
        Ok(())
    }
}

/// Mailer used when no email credentials are configured
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_visit_pass(&self, _email: &VisitEmail) -> VisitsResult<()> {
        Err(VisitsError::EmailDisabled)
    }
}

/// Mailer for the configured credentials, or a disabled one
pub fn mailer_from_config(config: &EmailConfig) -> VisitsResult<Arc<dyn Mailer>> {
    match config.credentials() {
        Some(credentials) => Ok(Arc::new(EmailJsMailer::new(credentials)?)),
        None => {
            warn!("Email credentials are not configured; visit passes will not be emailed");
            Ok(Arc::new(DisabledMailer))
        }
    }
}
