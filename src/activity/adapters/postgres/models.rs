//! Diesel row models for activity log persistence.

use super::schema::activity_logs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row shape shared by reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = activity_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ActivityRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Entity kind.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: uuid::Uuid,
    /// Owning task.
    pub task_id: Option<uuid::Uuid>,
    /// Action code.
    pub action: String,
    /// Human-readable description.
    pub description: String,
    /// Actor payload.
    pub actor: Value,
    /// Structured details.
    pub details: Value,
    /// Event timestamp.
    pub created_at: DateTime<Utc>,
}
