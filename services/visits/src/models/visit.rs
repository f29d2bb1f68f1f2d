//! Visit models and the status lifecycle

use auth::Host;
use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use common::Query;
use common::query::timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Visitor;

/// Lifecycle status of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Pending,
    Approved,
    Denied,
    Completed,
    Cancelled,
}

impl VisitStatus {
    pub const ALL: [VisitStatus; 5] = [
        VisitStatus::Pending,
        VisitStatus::Approved,
        VisitStatus::Denied,
        VisitStatus::Completed,
        VisitStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Pending => "pending",
            VisitStatus::Approved => "approved",
            VisitStatus::Denied => "denied",
            VisitStatus::Completed => "completed",
            VisitStatus::Cancelled => "cancelled",
        }
    }

    /// No action leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VisitStatus::Denied | VisitStatus::Completed | VisitStatus::Cancelled
        )
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisitStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown visit status: {}", s))
    }
}

/// Something staff can do to a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitAction {
    Approve,
    Deny,
    Complete,
    Cancel,
    CheckIn,
}

impl VisitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitAction::Approve => "approve",
            VisitAction::Deny => "deny",
            VisitAction::Complete => "complete",
            VisitAction::Cancel => "cancel",
            VisitAction::CheckIn => "check in",
        }
    }

    /// Status after applying this action to a visit in `from`, if allowed
    ///
    /// Check-in records arrival without changing the status.
    pub fn transition(&self, from: VisitStatus) -> Option<VisitStatus> {
        use VisitStatus::*;

        match (self, from) {
            (VisitAction::Approve, Pending) => Some(Approved),
            (VisitAction::Deny, Pending) => Some(Denied),
            (VisitAction::Complete, Approved) => Some(Completed),
            (VisitAction::Cancel, Pending | Approved) => Some(Cancelled),
            (VisitAction::CheckIn, Approved) => Some(Approved),
            _ => None,
        }
    }
}

impl fmt::Display for VisitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visit entity (row of `visits`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub visitor_id: Uuid,
    pub host_id: Option<Uuid>,
    pub purpose: String,
    pub status: VisitStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// New visit creation payload; the ID is generated client-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVisit {
    pub id: Uuid,
    pub visitor_id: Uuid,
    pub host_id: Option<Uuid>,
    pub purpose: String,
    pub status: VisitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewVisit {
    /// A pending visit with a fresh ID
    pub fn pending(
        visitor_id: Uuid,
        host_id: Option<Uuid>,
        purpose: &str,
        valid_until: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            visitor_id,
            host_id,
            purpose: purpose.to_string(),
            status: VisitStatus::Pending,
            check_in_time: None,
            check_out_time: None,
            valid_until,
            notes: None,
        }
    }
}

/// Columns written by a lifecycle action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitUpdate {
    pub status: VisitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl VisitUpdate {
    /// Update that moves a visit to `to` through `action` at `now`
    pub fn for_action(action: VisitAction, to: VisitStatus, now: DateTime<Utc>) -> Self {
        Self {
            status: to,
            approved_at: (action == VisitAction::Approve).then_some(now),
            check_in_time: (action == VisitAction::CheckIn).then_some(now),
            check_out_time: (action == VisitAction::Complete).then_some(now),
            updated_at: now,
        }
    }
}

/// Visit joined with its visitor and host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDetails {
    #[serde(flatten)]
    pub visit: Visit,
    pub visitor: Option<Visitor>,
    pub host: Option<Host>,
}

impl VisitDetails {
    /// Projection that embeds the visitor and host rows
    pub const SELECT: &'static str = "*, visitor:visitors(*), host:hosts(*)";

    pub fn visitor_name(&self) -> &str {
        self.visitor.as_ref().map(|v| v.name.as_str()).unwrap_or("Unknown")
    }

    pub fn visitor_email(&self) -> &str {
        self.visitor.as_ref().map(|v| v.email.as_str()).unwrap_or("")
    }

    pub fn host_name(&self) -> &str {
        self.host.as_ref().map(|h| h.name.as_str()).unwrap_or("N/A")
    }
}

/// Timestamp column a range applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeColumn {
    CreatedAt,
    ApprovedAt,
    CheckOutTime,
    ValidUntil,
}

impl TimeColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeColumn::CreatedAt => "created_at",
            TimeColumn::ApprovedAt => "approved_at",
            TimeColumn::CheckOutTime => "check_out_time",
            TimeColumn::ValidUntil => "valid_until",
        }
    }
}

/// Half-open UTC interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// The local calendar day `date` in `tz`, expressed in UTC
    pub fn local_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let next = date.succ_opt().unwrap_or(date);
        Self {
            start: local_midnight(date, tz),
            end: local_midnight(next, tz),
        }
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.start <= *instant && *instant < self.end
    }
}

/// First instant of `date` in `tz`
///
/// When midnight falls in a DST gap the first valid local instant after it
/// is used; when it is ambiguous the earlier one wins.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    resolve_local(date, NaiveTime::MIN, tz)
}

/// `date` at `time` in `tz`, expressed in UTC, skipping forward over DST gaps
pub fn resolve_local<Tz: TimeZone>(date: NaiveDate, time: NaiveTime, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    let mut probe = naive;

    for _ in 0..=(24 * 60) {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => probe += chrono::Duration::minutes(1),
        }
    }

    naive.and_utc()
}

/// Filter over visits shared by lists and counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitFilter {
    pub status: Option<VisitStatus>,
    pub host_id: Option<Uuid>,
    /// Column and range it must fall in
    pub range: Option<(TimeColumn, TimeRange)>,
    /// Also accept rows whose range column is null
    pub range_includes_null: bool,
    /// Only visits still valid at this instant
    pub valid_at: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl VisitFilter {
    pub fn status(status: VisitStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn for_host(mut self, host_id: Option<Uuid>) -> Self {
        self.host_id = host_id;
        self
    }

    pub fn within(mut self, column: TimeColumn, range: TimeRange) -> Self {
        self.range = Some((column, range));
        self
    }

    pub fn or_null(mut self) -> Self {
        self.range_includes_null = true;
        self
    }

    pub fn valid_at(mut self, instant: DateTime<Utc>) -> Self {
        self.valid_at = Some(instant);
        self
    }

    /// Add this filter's conditions to `query`
    pub fn apply(&self, mut query: Query) -> Query {
        if let Some(status) = self.status {
            query = query.eq("status", status);
        }
        if let Some(host_id) = self.host_id {
            query = query.eq("host_id", host_id);
        }
        if let Some((column, range)) = &self.range {
            let column = column.as_str();
            let start = timestamp(&range.start);
            let end = timestamp(&range.end);
            if self.range_includes_null {
                query = query.or(&format!(
                    "{column}.is.null,and({column}.gte.\"{start}\",{column}.lt.\"{end}\")"
                ));
            } else {
                query = query.gte(column, start).lt(column, end);
            }
        }
        if let Some(instant) = &self.valid_at {
            query = query.gte(TimeColumn::ValidUntil.as_str(), timestamp(instant));
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}
