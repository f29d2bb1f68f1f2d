//! The local day the dashboard counts over

use chrono::{DateTime, TimeZone, Utc};
use visits::models::TimeRange;

/// Local midnight to the next local midnight, in UTC, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The local day `now` falls in, in `now`'s own time zone
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        TimeRange::local_day(now.date_naive(), &now.timezone()).into()
    }

    /// Today in `tz`
    pub fn today<Tz: TimeZone>(tz: &Tz) -> Self {
        Self::containing(&Utc::now().with_timezone(tz))
    }

    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.range().contains(instant)
    }
}

impl From<TimeRange> for DayWindow {
    fn from(range: TimeRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}
