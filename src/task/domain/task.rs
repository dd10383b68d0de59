//! Task read model and related value types.

use super::{ContactId, ParseTaskStatusError, TaskFieldWrite, TaskId, WorkflowMirror};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status bucket as rendered by task lists and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting for the customer to confirm the order.
    AwaitingConfirmation,
    /// Task has been confirmed and is being planned.
    UnderPlanning,
    /// Task has a planned visit.
    Planned,
    /// Task is on hold.
    Standby,
    /// Task was cancelled.
    Cancelled,
    /// Task work is done.
    Completed,
    /// Task has been archived.
    Archived,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::UnderPlanning => "under_planning",
            Self::Planned => "planned",
            Self::Standby => "standby",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Status bucket a task moves into once its order is activated.
    #[must_use]
    pub const fn active() -> Self {
        Self::UnderPlanning
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "awaiting_confirmation" => Ok(Self::AwaitingConfirmation),
            "under_planning" => Ok(Self::UnderPlanning),
            "planned" => Ok(Self::Planned),
            "standby" => Ok(Self::Standby),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Street address of the task site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAddress {
    /// Street and house number.
    pub street: String,
    /// Postal code.
    pub postal_code: String,
    /// City name.
    pub city: String,
}

impl SiteAddress {
    /// Creates an address from its parts.
    #[must_use]
    pub fn new(
        street: impl Into<String>,
        postal_code: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            postal_code: postal_code.into(),
            city: city.into(),
        }
    }

    /// Renders the address on one line, e.g. `Main St 1, 7000 Fredericia`.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
            .trim()
            .to_owned()
    }
}

/// Customer contact denormalised onto the task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSnapshot {
    /// Directory contact the task points at, if any.
    pub contact_id: Option<ContactId>,
    /// Contact display name.
    pub name: Option<String>,
    /// Contact email address.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
}

/// Property owner ("bygherre") registered on the task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOwner {
    /// Owner display name.
    pub name: Option<String>,
    /// Owner phone number.
    pub phone: Option<String>,
    /// Owner email address.
    pub email: Option<String>,
}

/// Damage line registered on the task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDamage {
    /// Damaged building part.
    pub part: String,
    /// Location of the damage on the site.
    pub location: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Number of damaged units.
    pub quantity: u32,
}

/// Task read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    task_number: Option<String>,
    status: TaskStatus,
    address: SiteAddress,
    company_name: Option<String>,
    contact: ContactSnapshot,
    owners: Vec<PropertyOwner>,
    summary: Option<String>,
    damages: Vec<TaskDamage>,
    mirror: WorkflowMirror,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Human-facing task number.
    pub task_number: Option<String>,
    /// Current status bucket.
    pub status: TaskStatus,
    /// Site address.
    pub address: SiteAddress,
    /// Customer company name.
    pub company_name: Option<String>,
    /// Customer contact snapshot.
    pub contact: ContactSnapshot,
    /// Property owners, first owner first.
    pub owners: Vec<PropertyOwner>,
    /// Summary shown to external parties.
    pub summary: Option<String>,
    /// Registered damage lines.
    pub damages: Vec<TaskDamage>,
    /// Workflow mirror fields.
    pub mirror: WorkflowMirror,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            task_number: data.task_number,
            status: data.status,
            address: data.address,
            company_name: data.company_name,
            contact: data.contact,
            owners: data.owners,
            summary: data.summary,
            damages: data.damages,
            mirror: data.mirror,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the human-facing task number.
    #[must_use]
    pub fn task_number(&self) -> Option<&str> {
        self.task_number.as_deref()
    }

    /// Returns the status bucket.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the site address.
    #[must_use]
    pub const fn address(&self) -> &SiteAddress {
        &self.address
    }

    /// Returns the customer company name.
    #[must_use]
    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    /// Returns the customer contact snapshot.
    #[must_use]
    pub const fn contact(&self) -> &ContactSnapshot {
        &self.contact
    }

    /// Returns the property owners.
    #[must_use]
    pub fn owners(&self) -> &[PropertyOwner] {
        &self.owners
    }

    /// Returns the first property owner, if any.
    #[must_use]
    pub fn primary_owner(&self) -> Option<&PropertyOwner> {
        self.owners.first()
    }

    /// Returns the first non-empty owner phone number.
    ///
    /// Owners are reached by phone; the second owner is only used when the
    /// first has no number.
    #[must_use]
    pub fn owner_phone(&self) -> Option<&str> {
        self.owners
            .iter()
            .filter_map(|owner| owner.phone.as_deref())
            .map(str::trim)
            .find(|phone| !phone.is_empty())
    }

    /// Returns the summary shown to external parties.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the registered damage lines.
    #[must_use]
    pub fn damages(&self) -> &[TaskDamage] {
        &self.damages
    }

    /// Returns the workflow mirror fields.
    #[must_use]
    pub const fn mirror(&self) -> &WorkflowMirror {
        &self.mirror
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies one targeted mirror write.
    ///
    /// Only mirror fields and the status bucket are ever touched; identity
    /// and address fields are owned by the task subsystem.
    pub fn apply(&mut self, write: &TaskFieldWrite, at: DateTime<Utc>) {
        match write {
            TaskFieldWrite::Status(status) => self.status = *status,
            other => self.mirror.apply(other, at),
        }
        self.updated_at = at;
    }
}
