//! Diesel row model for ledger entries.

use super::schema::communication_ledger;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row shape shared by reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = communication_ledger)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LedgerRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Delivery channel.
    pub channel: String,
    /// Recipient address.
    pub recipient: String,
    /// Attempt result.
    pub status: String,
    /// Failure description.
    pub error: Option<String>,
    /// Provider message identifier.
    pub provider_id: Option<String>,
    /// Short content description.
    pub summary: String,
    /// Owning task.
    pub task_id: Option<uuid::Uuid>,
    /// Workflow record.
    pub workflow_id: Option<uuid::Uuid>,
    /// Workflow kind path segment.
    pub workflow_kind: Option<String>,
    /// Attempt start.
    pub created_at: DateTime<Utc>,
    /// Provider acceptance time.
    pub sent_at: Option<DateTime<Utc>>,
}
