//! Diesel row models for workflow record persistence.

use super::schema::workflow_records;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row shape shared by reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = workflow_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowRow {
    /// Record identifier.
    pub id: uuid::Uuid,
    /// Workflow kind code.
    pub kind: String,
    /// Live access token.
    pub token: String,
    /// Owning task.
    pub task_id: Option<uuid::Uuid>,
    /// State code.
    pub status: String,
    /// Whether the live token has a recorded response.
    pub responded: bool,
    /// Full record document.
    pub document: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: DateTime<Utc>,
}
