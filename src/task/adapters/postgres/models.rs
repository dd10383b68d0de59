//! Diesel row models for task persistence.

use super::schema::{contacts, tasks};
use crate::task::domain::{ContactSnapshot, PropertyOwner, SiteAddress, TaskDamage};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: uuid::Uuid,
    /// Human-facing task number.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Varchar>)]
    pub task_number: Option<String>,
    /// Status bucket.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub status: String,
    /// Details JSON payload.
    #[diesel(sql_type = diesel::sql_types::Jsonb)]
    pub details: Value,
    /// Workflow mirror JSON payload.
    #[diesel(sql_type = diesel::sql_types::Jsonb)]
    pub workflow_mirror: Value,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub updated_at: DateTime<Utc>,
}

/// Query result row for directory contacts.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContactRow {
    /// Directory identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

/// Shape of the `details` JSONB column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDetails {
    /// Site address.
    pub address: SiteAddress,
    /// Customer company name.
    pub company_name: Option<String>,
    /// Customer contact.
    pub contact: ContactSnapshot,
    /// Property owners.
    pub owners: Vec<PropertyOwner>,
    /// Summary shown to external parties.
    pub summary: Option<String>,
    /// Damage lines.
    pub damages: Vec<TaskDamage>,
}
