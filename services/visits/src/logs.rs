//! Visit logs with search and CSV export

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{VisitsError, VisitsResult};
use crate::models::{TimeColumn, TimeRange, VisitDetails, VisitFilter, VisitStatus};
use crate::repositories::VisitsRepository;

/// One row of the visit log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub visit_id: Uuid,
    pub visitor_name: String,
    pub visitor_email: String,
    pub host_name: String,
    pub purpose: String,
    pub status: VisitStatus,
    pub created_at: DateTime<Utc>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
}

impl From<&VisitDetails> for LogEntry {
    fn from(details: &VisitDetails) -> Self {
        Self {
            visit_id: details.visit.id,
            visitor_name: details.visitor_name().to_string(),
            visitor_email: details.visitor_email().to_string(),
            host_name: details.host_name().to_string(),
            purpose: details.visit.purpose.clone(),
            status: details.visit.status,
            created_at: details.visit.created_at,
            check_in_time: details.visit.check_in_time,
            check_out_time: details.visit.check_out_time,
            valid_until: details.visit.valid_until,
        }
    }
}

pub struct VisitLogs {
    visits: Arc<dyn VisitsRepository>,
}

impl VisitLogs {
    pub fn new(visits: Arc<dyn VisitsRepository>) -> Self {
        Self { visits }
    }

    /// Visits created on the local `date` in `tz`, or all visits
    ///
    /// Hosts pass their own id as `host_id` and see only their visits.
    pub async fn entries<Tz: TimeZone>(
        &self,
        host_id: Option<Uuid>,
        date: Option<NaiveDate>,
        tz: &Tz,
    ) -> VisitsResult<Vec<LogEntry>> {
        let mut filter = VisitFilter::default().for_host(host_id);
        if let Some(date) = date {
            filter = filter.within(TimeColumn::CreatedAt, TimeRange::local_day(date, tz));
        }

        let visits = self.visits.list(&filter).await?;
        Ok(visits.iter().map(LogEntry::from).collect())
    }
}

/// Entries whose visitor or host name contains `term`, ignoring case
pub fn search_entries<'a>(entries: &'a [LogEntry], term: &str) -> Vec<&'a LogEntry> {
    let term = term.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            term.is_empty()
                || entry.visitor_name.to_lowercase().contains(&term)
                || entry.host_name.to_lowercase().contains(&term)
        })
        .collect()
}

/// Columns of the exported log, in the order of `LogEntry`'s fields
pub const LOG_COLUMNS: [&str; 10] = [
    "visit_id",
    "visitor_name",
    "visitor_email",
    "host_name",
    "purpose",
    "status",
    "created_at",
    "check_in_time",
    "check_out_time",
    "valid_until",
];

/// Write `entries` as CSV with a header row, even when there are none
pub fn export_csv<'a, W, I>(entries: I, writer: W) -> VisitsResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a LogEntry>,
{
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(LOG_COLUMNS)?;
    for entry in entries {
        csv.serialize(entry)?;
    }
    csv.flush().map_err(|e| VisitsError::Csv(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Visit, Visitor};
    use crate::repositories::MockVisitsRepository;
    use auth::{Host, Role};
    use chrono::FixedOffset;
    use tokio_test::assert_ok;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    fn entry(visitor: &str, host: &str) -> LogEntry {
        LogEntry {
            visit_id: Uuid::nil(),
            visitor_name: visitor.to_string(),
            visitor_email: "guest@example.com".to_string(),
            host_name: host.to_string(),
            purpose: "Tour".to_string(),
            status: VisitStatus::Completed,
            created_at: at("2024-03-10T08:00:00Z"),
            check_in_time: Some(at("2024-03-10T09:00:00Z")),
            check_out_time: None,
            valid_until: at("2024-03-10T17:00:00Z"),
        }
    }

    #[test]
    fn test_search_matches_visitor_or_host() {
        let entries = vec![entry("Ada", "Prof. Smith"), entry("Bob", "Dr. Jones")];

        assert_eq!(search_entries(&entries, "smith")[0].visitor_name, "Ada");
        assert_eq!(search_entries(&entries, "BOB").len(), 1);
        assert_eq!(search_entries(&entries, "").len(), 2);
        assert!(search_entries(&entries, "zed").is_empty());
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let entries = vec![entry("Ada", "Prof. Smith")];
        let mut out = Vec::new();
        export_csv(&entries, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "visit_id,visitor_name,visitor_email,host_name,purpose,status,created_at,check_in_time,check_out_time,valid_until"
            )
        );
        let row = lines.next().unwrap();
        assert!(row.contains("Ada,guest@example.com,Prof. Smith,Tour,completed"));
        assert!(row.contains(",,"));
    }

    #[test]
    fn test_export_without_entries_still_writes_header() {
        let mut out = Vec::new();
        export_csv(&Vec::<LogEntry>::new(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("{}\n", LOG_COLUMNS.join(",")));
    }

    #[tokio::test]
    async fn test_entries_filter_on_local_creation_day() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let expected = TimeRange::local_day(date, &tz);

        let visit = VisitDetails {
            visit: Visit {
                id: Uuid::new_v4(),
                visitor_id: Uuid::new_v4(),
                host_id: None,
                purpose: "Tour".to_string(),
                status: VisitStatus::Pending,
                check_in_time: None,
                check_out_time: None,
                valid_until: at("2024-03-10T20:00:00Z"),
                notes: None,
                created_at: at("2024-03-10T12:00:00Z"),
                approved_at: None,
                updated_at: at("2024-03-10T12:00:00Z"),
            },
            visitor: Some(Visitor {
                id: Uuid::new_v4(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: "555".to_string(),
                company: None,
                photo_url: None,
                created_at: at("2024-03-10T12:00:00Z"),
                updated_at: at("2024-03-10T12:00:00Z"),
            }),
            host: Some(Host {
                id: Uuid::new_v4(),
                auth_id: Uuid::new_v4(),
                name: "Prof. Smith".to_string(),
                email: "smith@example.com".to_string(),
                department_id: None,
                role: Role::Host,
                active: true,
                created_at: at("2024-01-01T00:00:00Z"),
                updated_at: at("2024-01-01T00:00:00Z"),
            }),
        };

        let mut visits = MockVisitsRepository::new();
        visits
            .expect_list()
            .withf(move |filter| {
                filter.status.is_none()
                    && filter.range == Some((TimeColumn::CreatedAt, expected))
            })
            .times(1)
            .returning(move |_| Ok(vec![visit.clone()]));

        let logs = VisitLogs::new(Arc::new(visits));
        let entries = assert_ok!(logs.entries(None, Some(date), &tz).await);

        assert_eq!(expected.start, at("2024-03-10T05:00:00Z"));
        assert_eq!(entries[0].visitor_name, "Ada");
        assert_eq!(entries[0].host_name, "Prof. Smith");
    }
}
