//! Visit repository

use async_trait::async_trait;
use common::{Order, PlatformClient, PlatformResult, Query};
use mockall::automock;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewVisit, VisitDetails, VisitFilter, VisitStatus, VisitUpdate};

const TABLE: &str = "visits";

#[automock]
#[async_trait]
pub trait VisitsRepository: Send + Sync {
    /// One visit with its visitor and host
    async fn find(&self, id: Uuid) -> PlatformResult<Option<VisitDetails>>;

    /// Visits matching `filter`, newest first
    async fn list(&self, filter: &VisitFilter) -> PlatformResult<Vec<VisitDetails>>;

    /// Number of visits matching `filter`
    async fn count(&self, filter: &VisitFilter) -> PlatformResult<u64>;

    /// Insert a visit; the row is not read back
    async fn create(&self, visit: &NewVisit) -> PlatformResult<()>;

    /// Insert several visits in one request
    async fn create_many(&self, visits: &[NewVisit]) -> PlatformResult<()>;

    /// Apply `changes` only if the visit is still in `expected`
    ///
    /// Returns `None` when no row matched.
    async fn update_status(
        &self,
        id: Uuid,
        expected: VisitStatus,
        changes: &VisitUpdate,
    ) -> PlatformResult<Option<VisitDetails>>;
}

/// `VisitsRepository` backed by the platform's table API
#[derive(Clone, Debug)]
pub struct PlatformVisitsRepository {
    client: PlatformClient,
}

impl PlatformVisitsRepository {
    /// Create a new visit repository
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    fn details() -> Query {
        Query::table(TABLE).select(VisitDetails::SELECT)
    }
}

#[async_trait]
impl VisitsRepository for PlatformVisitsRepository {
    async fn find(&self, id: Uuid) -> PlatformResult<Option<VisitDetails>> {
        self.client.fetch_optional(&Self::details().eq("id", id)).await
    }

    async fn list(&self, filter: &VisitFilter) -> PlatformResult<Vec<VisitDetails>> {
        let query = filter.apply(Self::details().order("created_at", Order::Descending));
        self.client.fetch_all(&query).await
    }

    async fn count(&self, filter: &VisitFilter) -> PlatformResult<u64> {
        let query = filter.apply(Query::table(TABLE).select("id"));
        self.client.count(&query).await
    }

    async fn create(&self, visit: &NewVisit) -> PlatformResult<()> {
        info!("Creating visit {} for visitor {}", visit.id, visit.visitor_id);
        self.client.insert_minimal(TABLE, visit).await
    }

    async fn create_many(&self, visits: &[NewVisit]) -> PlatformResult<()> {
        if visits.is_empty() {
            return Ok(());
        }
        info!("Creating {} visits", visits.len());
        self.client.insert_minimal(TABLE, visits).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: VisitStatus,
        changes: &VisitUpdate,
    ) -> PlatformResult<Option<VisitDetails>> {
        info!("Updating visit {} from {} to {}", id, expected, changes.status);
        let query = Self::details().eq("id", id).eq("status", expected);
        let mut rows: Vec<VisitDetails> = self.client.update(&query, changes).await?;
        Ok(rows.pop())
    }
}
