//! Activity entry and actor types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use super::ActivityAction;
use crate::task::domain::TaskId;

/// Unique identifier for an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityEntryId(Uuid);

impl ActivityEntryId {
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

impl Default for ActivityEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivityEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of entity an activity entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A portal task.
    Task,
    /// A photo report not yet linked to a task.
    PhotoReport,
}

impl EntityType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::PhotoReport => "photo_report",
        }
    }
}

/// Authenticated staff member acting through the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffActor {
    /// Staff user identifier.
    pub id: String,
    /// Staff display name.
    pub name: String,
}

impl StaffActor {
    /// Creates a staff actor.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Who performed the recorded action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// A staff member.
    Staff(StaffActor),
    /// An unauthenticated external party identified by contact details.
    External {
        /// Email, name or other identity the party is known by.
        identity: String,
    },
}

impl Actor {
    /// Creates an external actor.
    #[must_use]
    pub fn external(identity: impl Into<String>) -> Self {
        Self::External {
            identity: identity.into(),
        }
    }

    /// Returns the name shown next to the entry.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Staff(staff) => &staff.name,
            Self::External { identity } => identity,
        }
    }
}

/// One business event in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    /// Entry identifier.
    pub id: ActivityEntryId,
    /// Kind of entity the entry is about.
    pub entity_type: EntityType,
    /// Identifier of that entity.
    pub entity_id: Uuid,
    /// Owning task, when known.
    pub task_id: Option<TaskId>,
    /// Action code.
    pub action: ActivityAction,
    /// Human-readable description.
    pub description: String,
    /// Who performed the action.
    pub actor: Actor,
    /// Structured details.
    pub details: Value,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    /// Creates an entry about a task.
    #[must_use]
    pub fn for_task(
        task_id: TaskId,
        action: ActivityAction,
        description: impl Into<String>,
        actor: Actor,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityEntryId::new(),
            entity_type: EntityType::Task,
            entity_id: task_id.into_inner(),
            task_id: Some(task_id),
            action,
            description: description.into(),
            actor,
            details: Value::Null,
            created_at,
        }
    }

    /// Creates an entry about an arbitrary entity.
    #[must_use]
    pub fn for_entity(
        entity_type: EntityType,
        entity_id: Uuid,
        action: ActivityAction,
        description: impl Into<String>,
        actor: Actor,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityEntryId::new(),
            entity_type,
            entity_id,
            task_id: None,
            action,
            description: description.into(),
            actor,
            details: Value::Null,
            created_at,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}
