//! Department repository

use async_trait::async_trait;
use common::{Order, PlatformClient, PlatformResult, Query};
use mockall::automock;

use crate::models::Department;

#[automock]
#[async_trait]
pub trait DepartmentsRepository: Send + Sync {
    /// Every department, ordered by name
    async fn list(&self) -> PlatformResult<Vec<Department>>;
}

#[derive(Clone, Debug)]
pub struct PlatformDepartmentsRepository {
    client: PlatformClient,
}

impl PlatformDepartmentsRepository {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DepartmentsRepository for PlatformDepartmentsRepository {
    async fn list(&self) -> PlatformResult<Vec<Department>> {
        self.client
            .fetch_all(&Query::table("departments").order("name", Order::Ascending))
            .await
    }
}
