//! Visitor models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visitor entity (row of `visitors`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New visitor creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVisitor {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub photo_url: Option<String>,
}

/// Visitor update payload
///
/// `None` leaves a column untouched; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl VisitorUpdate {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            name: None,
            phone: None,
            company: None,
            photo_url: None,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_only_serializes_set_columns() {
        let now = DateTime::parse_from_rfc3339("2024-03-10T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let update = VisitorUpdate {
            photo_url: Some(None),
            ..VisitorUpdate::new(now)
        };

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "photo_url": null, "updated_at": "2024-03-10T09:00:00Z" })
        );
    }
}
