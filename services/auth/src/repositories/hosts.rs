//! Host repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Order, PlatformClient, PlatformResult, Query};
use mockall::automock;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{Host, NewHost, Role};

const TABLE: &str = "hosts";

/// Access to system users
#[automock]
#[async_trait]
pub trait HostsRepository: Send + Sync {
    /// Host linked to a platform identity
    async fn find_by_auth_id(&self, auth_id: Uuid) -> PlatformResult<Option<Host>>;

    /// Host with `email`, optionally restricted to one role
    async fn find_by_email(&self, email: &str, role: Option<Role>) -> PlatformResult<Option<Host>>;

    async fn list(&self) -> PlatformResult<Vec<Host>>;

    async fn count(&self) -> PlatformResult<u64>;

    async fn create(&self, host: &NewHost) -> PlatformResult<Host>;
}

/// `HostsRepository` backed by the platform's table API
#[derive(Clone, Debug)]
pub struct PlatformHostsRepository {
    client: PlatformClient,
}

impl PlatformHostsRepository {
    /// Create a new host repository
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HostsRepository for PlatformHostsRepository {
    async fn find_by_auth_id(&self, auth_id: Uuid) -> PlatformResult<Option<Host>> {
        info!("Finding host by auth ID: {}", auth_id);
        self.client
            .fetch_optional(&Query::table(TABLE).eq("auth_id", auth_id))
            .await
    }

    async fn find_by_email(&self, email: &str, role: Option<Role>) -> PlatformResult<Option<Host>> {
        info!("Finding host by email: {}", email);
        let mut query = Query::table(TABLE).eq("email", email.trim());
        if let Some(role) = role {
            query = query.eq("role", role);
        }
        self.client.fetch_optional(&query).await
    }

    async fn list(&self) -> PlatformResult<Vec<Host>> {
        self.client
            .fetch_all(&Query::table(TABLE).order("name", Order::Ascending))
            .await
    }

    async fn count(&self) -> PlatformResult<u64> {
        self.client.count(&Query::table(TABLE).select("id")).await
    }

    async fn create(&self, host: &NewHost) -> PlatformResult<Host> {
        info!("Creating host {} with role {}", host.email, host.role);
        let row = HostRow {
            id: Uuid::new_v4(),
            host,
        };
        // A new account may not be allowed to read its own row back yet
        self.client.insert_minimal(TABLE, &row).await?;
        Ok(row.stored(Utc::now()))
    }
}

#[derive(Serialize)]
struct HostRow<'a> {
    id: Uuid,
    #[serde(flatten)]
    host: &'a NewHost,
}

impl HostRow<'_> {
    fn stored(&self, now: DateTime<Utc>) -> Host {
        Host {
            id: self.id,
            auth_id: self.host.auth_id,
            name: self.host.name.clone(),
            email: self.host.email.clone(),
            department_id: Some(self.host.department_id),
            role: self.host.role,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
