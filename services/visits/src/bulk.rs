//! Bulk visitor upload from CSV
//!
//! Expected header: `name,email,phone,purpose,valid_until`. The whole upload
//! costs one host lookup, one visitor lookup, at most one visitor insert and
//! one visit insert.

use auth::repositories::HostsRepository;
use auth::{Host, Role};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{VisitsError, VisitsResult};
use crate::models::visit::resolve_local;
use crate::models::{NewVisit, NewVisitor};
use crate::registration::NO_PHONE;
use crate::repositories::{VisitorsRepository, VisitsRepository};

const NO_PURPOSE: &str = "N/A";

/// One CSV row; every column is optional at parse time
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BulkRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
}

/// A row left out of the upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the file, header included
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome {
    pub host: Host,
    pub visits_created: usize,
    pub visitors_created: usize,
    pub skipped: Vec<SkippedRow>,
}

/// A row ready to insert
#[derive(Debug, Clone, PartialEq)]
struct ParsedRow {
    line: u64,
    name: String,
    email: String,
    phone: String,
    purpose: String,
    valid_until: DateTime<Utc>,
}

/// Read every non-empty record of `reader`
pub fn read_rows<R: Read>(reader: R) -> VisitsResult<Vec<(u64, BulkRow)>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        let row: BulkRow = record.deserialize(Some(&headers))?;
        if row == BulkRow::default() {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push((line, row));
    }
    Ok(rows)
}

/// Parse a `valid_until` cell
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` or `YYYY-MM-DDTHH:MM[:SS]` in
/// `tz`, or a bare date meaning local midnight.
pub fn parse_valid_until<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(resolve_local(naive.date(), naive.time(), tz));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| resolve_local(date, NaiveTime::MIN, tz))
}

pub struct BulkUploadService {
    visitors: Arc<dyn VisitorsRepository>,
    visits: Arc<dyn VisitsRepository>,
    hosts: Arc<dyn HostsRepository>,
}

impl BulkUploadService {
    pub fn new(
        visitors: Arc<dyn VisitorsRepository>,
        visits: Arc<dyn VisitsRepository>,
        hosts: Arc<dyn HostsRepository>,
    ) -> Self {
        Self {
            visitors,
            visits,
            hosts,
        }
    }

    /// Create one pending visit per usable row of `csv` for `host_email`
    ///
    /// Rows without a name or email, or with an unreadable `valid_until`, are
    /// skipped and reported. Missing phone and purpose become `N/A`; a missing
    /// `valid_until` means now.
    pub async fn upload<R: Read, Tz: TimeZone>(
        &self,
        actor: &Host,
        host_email: &str,
        csv: R,
        tz: &Tz,
    ) -> VisitsResult<BulkOutcome> {
        let host_email = host_email.trim();
        if host_email.is_empty() {
            return Err(VisitsError::Validation("Host email is required.".to_string()));
        }
        if actor.role == Role::Host && !actor.email.eq_ignore_ascii_case(host_email) {
            return Err(VisitsError::Forbidden(
                "Hosts can only upload their own visitors".to_string(),
            ));
        }

        let host = self
            .hosts
            .find_by_email(host_email, None)
            .await?
            .ok_or_else(|| VisitsError::HostNotFound(host_email.to_string()))?;

        let rows = read_rows(csv)?;
        if rows.is_empty() {
            return Err(VisitsError::Validation(
                "The CSV file is empty or invalid.".to_string(),
            ));
        }

        let now = Utc::now();
        let (parsed, skipped) = prepare(rows, now, tz);
        for row in &skipped {
            warn!("Skipping CSV line {}: {}", row.line, row.reason);
        }
        if parsed.is_empty() {
            return Ok(BulkOutcome {
                host,
                visits_created: 0,
                visitors_created: 0,
                skipped,
            });
        }

        let mut emails: Vec<String> = parsed.iter().map(|row| row.email.clone()).collect();
        emails.sort();
        emails.dedup();

        let mut ids: HashMap<String, Uuid> = self
            .visitors
            .find_by_emails(&emails)
            .await?
            .into_iter()
            .map(|visitor| (visitor.email, visitor.id))
            .collect();

        let mut new_visitors: Vec<NewVisitor> = Vec::new();
        for row in &parsed {
            if ids.contains_key(&row.email) || new_visitors.iter().any(|v| v.email == row.email) {
                continue;
            }
            new_visitors.push(NewVisitor {
                name: row.name.clone(),
                email: row.email.clone(),
                phone: row.phone.clone(),
                company: None,
                photo_url: None,
            });
        }

        let inserted = self.visitors.create_many(&new_visitors).await?;
        let visitors_created = inserted.len();
        ids.extend(inserted.into_iter().map(|visitor| (visitor.email, visitor.id)));

        let mut visits = Vec::with_capacity(parsed.len());
        let mut skipped = skipped;
        for row in parsed {
            match ids.get(&row.email) {
                Some(visitor_id) => visits.push(NewVisit::pending(
                    *visitor_id,
                    Some(host.id),
                    &row.purpose,
                    row.valid_until,
                )),
                None => skipped.push(SkippedRow {
                    line: row.line,
                    reason: format!("No visitor record for {}", row.email),
                }),
            }
        }

        self.visits.create_many(&visits).await?;
        info!(
            "Bulk upload by {} created {} visits for {}",
            actor.email,
            visits.len(),
            host.email
        );

        Ok(BulkOutcome {
            host,
            visits_created: visits.len(),
            visitors_created,
            skipped,
        })
    }
}

fn prepare<Tz: TimeZone>(
    rows: Vec<(u64, BulkRow)>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> (Vec<ParsedRow>, Vec<SkippedRow>) {
    let mut parsed = Vec::new();
    let mut skipped = Vec::new();

    for (line, row) in rows {
        let (Some(name), Some(email)) = (non_empty(row.name), non_empty(row.email)) else {
            skipped.push(SkippedRow {
                line,
                reason: "Name and email are required".to_string(),
            });
            continue;
        };

        let valid_until = match non_empty(row.valid_until) {
            None => now,
            Some(value) => match parse_valid_until(&value, tz) {
                Some(instant) => instant,
                None => {
                    skipped.push(SkippedRow {
                        line,
                        reason: format!("Unreadable valid_until: {}", value),
                    });
                    continue;
                }
            },
        };

        parsed.push(ParsedRow {
            line,
            name,
            email,
            phone: non_empty(row.phone).unwrap_or_else(|| NO_PHONE.to_string()),
            purpose: non_empty(row.purpose).unwrap_or_else(|| NO_PURPOSE.to_string()),
            valid_until,
        });
    }

    (parsed, skipped)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
