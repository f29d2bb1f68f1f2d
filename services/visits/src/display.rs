//! Public display board of approved visits

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::VisitsResult;
use crate::models::{VisitDetails, VisitFilter, VisitStatus};
use crate::repositories::VisitsRepository;

/// One line of the board
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub visit_id: Uuid,
    pub visitor_name: String,
    pub host_name: String,
    pub purpose: String,
    pub valid_until: DateTime<Utc>,
    pub checked_in: bool,
}

impl From<&VisitDetails> for DisplayEntry {
    fn from(details: &VisitDetails) -> Self {
        Self {
            visit_id: details.visit.id,
            visitor_name: details.visitor_name().to_string(),
            host_name: details.host_name().to_string(),
            purpose: details.visit.purpose.clone(),
            valid_until: details.visit.valid_until,
            checked_in: details.visit.check_in_time.is_some(),
        }
    }
}

#[derive(Clone)]
pub struct DisplayBoard {
    visits: Arc<dyn VisitsRepository>,
}

impl DisplayBoard {
    pub fn new(visits: Arc<dyn VisitsRepository>) -> Self {
        Self { visits }
    }

    /// Approved visits still valid at `now`, newest first
    pub async fn entries(&self, now: DateTime<Utc>) -> VisitsResult<Vec<DisplayEntry>> {
        let filter = VisitFilter::status(VisitStatus::Approved).valid_at(now);
        let visits = self.visits.list(&filter).await?;
        Ok(visits.iter().map(DisplayEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Visit;
    use crate::repositories::MockVisitsRepository;
    use chrono::Duration;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_entries_query_approved_and_still_valid() {
        let now = Utc::now();
        let visit = VisitDetails {
            visit: Visit {
                id: Uuid::new_v4(),
                visitor_id: Uuid::new_v4(),
                host_id: None,
                purpose: "Tour".to_string(),
                status: VisitStatus::Approved,
                check_in_time: Some(now),
                check_out_time: None,
                valid_until: now + Duration::hours(1),
                notes: None,
                created_at: now,
                approved_at: Some(now),
                updated_at: now,
            },
            visitor: None,
            host: None,
        };

        let mut visits = MockVisitsRepository::new();
        visits
            .expect_list()
            .withf(move |filter| {
                filter.status == Some(VisitStatus::Approved) && filter.valid_at == Some(now)
            })
            .times(1)
            .returning(move |_| Ok(vec![visit.clone()]));

        let board = DisplayBoard::new(Arc::new(visits));
        let entries = assert_ok!(board.entries(now).await);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].visitor_name, "Unknown");
        assert_eq!(entries[0].host_name, "N/A");
        assert!(entries[0].checked_in);
    }
}
