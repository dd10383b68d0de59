//! Communication ledger entries.

use super::{Channel, NotificationDomainError};
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerEntryId(Uuid);

impl LedgerEntryId {
    /// Creates a new random entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entry identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for LedgerEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LedgerEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The provider accepted the message.
    Sent,
    /// The attempt failed or timed out.
    Failed,
}

impl DeliveryStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for DeliveryStatus {
    type Error = NotificationDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(NotificationDomainError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Back-reference from a ledger entry to the business object it served.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReference {
    /// Owning task.
    pub task_id: Option<TaskId>,
    /// Workflow record the message was about.
    pub workflow_id: Option<Uuid>,
    /// Workflow kind path segment, e.g. `order-confirmation`.
    pub workflow_kind: Option<String>,
}

impl LedgerReference {
    /// Creates a reference to a workflow record.
    #[must_use]
    pub fn workflow(task_id: Option<TaskId>, workflow_id: Uuid, kind: &str) -> Self {
        Self {
            task_id,
            workflow_id: Some(workflow_id),
            workflow_kind: Some(kind.to_owned()),
        }
    }
}

/// Immutable record of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// Delivery channel.
    pub channel: Channel,
    /// Recipient address as submitted to the provider.
    pub to: String,
    /// Attempt result.
    pub status: DeliveryStatus,
    /// Failure description.
    pub error: Option<String>,
    /// Provider message identifier.
    pub provider_id: Option<String>,
    /// Short content description.
    pub summary: String,
    /// Business back-reference.
    pub reference: LedgerReference,
    /// When the attempt started.
    pub created_at: DateTime<Utc>,
    /// When the provider accepted the message.
    pub sent_at: Option<DateTime<Utc>>,
}

/// "Has the customer been contacted" indicators for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    /// At least one SMS was accepted by the provider.
    pub sms_sent: bool,
    /// At least one email was accepted by the provider.
    pub email_sent: bool,
    /// Most recent successful contact.
    pub last_contact_at: Option<DateTime<Utc>>,
}

impl ContactSummary {
    /// Folds ledger entries into a summary. Failed attempts are ignored.
    #[must_use]
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        entries
            .into_iter()
            .filter(|entry| entry.status == DeliveryStatus::Sent)
            .fold(Self::default(), |mut summary, entry| {
                match entry.channel {
                    Channel::Sms => summary.sms_sent = true,
                    Channel::Email => summary.email_sent = true,
                }
                let contacted_at = entry.sent_at.unwrap_or(entry.created_at);
                summary.last_contact_at = summary
                    .last_contact_at
                    .map_or(Some(contacted_at), |seen| Some(seen.max(contacted_at)));
                summary
            })
    }
}
