//! Host model: a system user linked to a platform identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Host entity (row of `hosts`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: Uuid,
    pub auth_id: Uuid,
    pub name: String,
    pub email: String,
    pub department_id: Option<Uuid>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// New host creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHost {
    pub auth_id: Uuid,
    pub name: String,
    pub email: String,
    pub department_id: Uuid,
    pub role: Role,
}
