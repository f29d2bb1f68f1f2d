//! Visitor repository

use async_trait::async_trait;
use common::{PlatformClient, PlatformError, PlatformResult, Query};
use mockall::automock;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewVisitor, Visitor, VisitorUpdate};

const TABLE: &str = "visitors";

#[automock]
#[async_trait]
pub trait VisitorsRepository: Send + Sync {
    /// Visitor registered with `email`
    async fn find_by_email(&self, email: &str) -> PlatformResult<Option<Visitor>>;

    /// Every visitor whose email is in `emails`
    async fn find_by_emails(&self, emails: &[String]) -> PlatformResult<Vec<Visitor>>;

    async fn create(&self, visitor: &NewVisitor) -> PlatformResult<Visitor>;

    /// Insert several visitors in one request
    async fn create_many(&self, visitors: &[NewVisitor]) -> PlatformResult<Vec<Visitor>>;

    async fn update(&self, id: Uuid, changes: &VisitorUpdate) -> PlatformResult<Visitor>;
}

/// `VisitorsRepository` backed by the platform's table API
#[derive(Clone, Debug)]
pub struct PlatformVisitorsRepository {
    client: PlatformClient,
}

impl PlatformVisitorsRepository {
    /// Create a new visitor repository
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VisitorsRepository for PlatformVisitorsRepository {
    async fn find_by_email(&self, email: &str) -> PlatformResult<Option<Visitor>> {
        info!("Finding visitor by email: {}", email);
        self.client
            .fetch_optional(&Query::table(TABLE).eq("email", email))
            .await
    }

    async fn find_by_emails(&self, emails: &[String]) -> PlatformResult<Vec<Visitor>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .fetch_all(&Query::table(TABLE).in_list("email", emails))
            .await
    }

    async fn create(&self, visitor: &NewVisitor) -> PlatformResult<Visitor> {
        info!("Creating visitor: {}", visitor.email);
        let mut rows: Vec<Visitor> = self.client.insert(TABLE, visitor).await?;
        rows.pop()
            .ok_or_else(|| PlatformError::NotFound(TABLE.to_string()))
    }

    async fn create_many(&self, visitors: &[NewVisitor]) -> PlatformResult<Vec<Visitor>> {
        if visitors.is_empty() {
            return Ok(Vec::new());
        }
        info!("Creating {} visitors", visitors.len());
        self.client.insert(TABLE, visitors).await
    }

    async fn update(&self, id: Uuid, changes: &VisitorUpdate) -> PlatformResult<Visitor> {
        info!("Updating visitor: {}", id);
        let mut rows: Vec<Visitor> = self
            .client
            .update(&Query::table(TABLE).eq("id", id), changes)
            .await?;
        rows.pop()
            .ok_or_else(|| PlatformError::NotFound(TABLE.to_string()))
    }
}
