//! Role-scoped visit statistics

use auth::repositories::HostsRepository;
use auth::{Host, Role};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use visits::models::{TimeColumn, VisitDetails, VisitFilter, VisitStatus};
use visits::repositories::VisitsRepository;

use crate::error::{DashboardError, DashboardResult};
use crate::window::DayWindow;

/// One tile of the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: u64,
    /// Status the card drills down into
    pub status: Option<VisitStatus>,
}

impl StatCard {
    /// False for cards that count across all time
    pub fn counts_today(&self) -> bool {
        matches!(
            self.status,
            Some(VisitStatus::Approved | VisitStatus::Pending | VisitStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub cards: Vec<StatCard>,
}

impl DashboardStats {
    pub fn card(&self, label: &str) -> Option<&StatCard> {
        self.cards.iter().find(|card| card.label == label)
    }
}

pub const TOTAL_USERS: &str = "Total Users";
pub const APPROVED: &str = "Approved";
pub const NEW_REQUESTS: &str = "New Visit Requests";
pub const COMPLETED: &str = "Completed";
pub const CANCELLED: &str = "Cancelled";

/// Filter behind the card or drill-down of `status`
///
/// Approved visits also match when `approved_at` was never recorded.
pub fn status_filter(status: VisitStatus, window: &DayWindow, host_id: Option<Uuid>) -> VisitFilter {
    let filter = VisitFilter::status(status).for_host(host_id);
    match status {
        VisitStatus::Pending => filter.within(TimeColumn::CreatedAt, window.range()),
        VisitStatus::Approved => filter.within(TimeColumn::ApprovedAt, window.range()),
        VisitStatus::Completed => filter.within(TimeColumn::CheckOutTime, window.range()),
        VisitStatus::Denied | VisitStatus::Cancelled => filter,
    }
}

pub struct StatsService {
    visits: Arc<dyn VisitsRepository>,
    hosts: Arc<dyn HostsRepository>,
}

impl StatsService {
    pub fn new(visits: Arc<dyn VisitsRepository>, hosts: Arc<dyn HostsRepository>) -> Self {
        Self { visits, hosts }
    }

    /// Cards for `viewer` over `window`
    ///
    /// Admins also get the user count. Hosts only count their own visits.
    pub async fn fetch(&self, viewer: &Host, window: &DayWindow) -> DashboardResult<DashboardStats> {
        let host_id = scope(viewer)?;

        let approved = status_filter(VisitStatus::Approved, window, host_id);
        let pending = status_filter(VisitStatus::Pending, window, host_id);
        let completed = status_filter(VisitStatus::Completed, window, host_id);
        let cancelled = status_filter(VisitStatus::Cancelled, window, host_id);

        let (approved, pending, completed, cancelled) = tokio::try_join!(
            self.visits.count(&approved),
            self.visits.count(&pending),
            self.visits.count(&completed),
            self.visits.count(&cancelled),
        )?;

        let mut cards = Vec::with_capacity(5);
        if viewer.role == Role::Admin {
            cards.push(StatCard {
                label: TOTAL_USERS,
                value: self.hosts.count().await?,
                status: None,
            });
        }
        cards.extend([
            StatCard {
                label: APPROVED,
                value: approved,
                status: Some(VisitStatus::Approved),
            },
            StatCard {
                label: NEW_REQUESTS,
                value: pending,
                status: Some(VisitStatus::Pending),
            },
            StatCard {
                label: COMPLETED,
                value: completed,
                status: Some(VisitStatus::Completed),
            },
            StatCard {
                label: CANCELLED,
                value: cancelled,
                status: Some(VisitStatus::Cancelled),
            },
        ]);

        info!("Dashboard stats refreshed for {}", viewer.email);
        Ok(DashboardStats { cards })
    }

    /// Visits behind the card of `status`
    pub async fn visits_for_status(
        &self,
        viewer: &Host,
        status: VisitStatus,
        window: &DayWindow,
    ) -> DashboardResult<Vec<VisitDetails>> {
        let mut filter = status_filter(status, window, scope(viewer)?);
        if status == VisitStatus::Approved {
            filter = filter.or_null();
        }
        Ok(self.visits.list(&filter).await?)
    }
}

fn scope(viewer: &Host) -> DashboardResult<Option<Uuid>> {
    match viewer.role {
        Role::Admin | Role::Guard => Ok(None),
        Role::Host => Ok(Some(viewer.id)),
        Role::Unsupported => Err(DashboardError::UnsupportedRole),
    }
}
