//! Generic persisted workflow record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AccessToken, WorkflowDefinition, WorkflowDomainError, WorkflowId, WorkflowKind, WorkflowState,
};
use crate::activity::domain::StaffActor;
use crate::task::domain::TaskId;

/// Staff members behind a record's lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    /// Who created the record.
    pub created_by: Option<StaffActor>,
    /// Who last dispatched the link.
    pub sent_by: Option<StaffActor>,
    /// Who finalised the record.
    pub finalized_by: Option<StaffActor>,
}

/// Parameter object for creating a workflow record.
#[derive(Debug, Clone)]
pub struct NewWorkflow<K: WorkflowDefinition> {
    /// Freshly issued access token.
    pub token: AccessToken,
    /// Owning task, when known.
    pub task_id: Option<TaskId>,
    /// Initial state.
    pub status: K::State,
    /// Response units.
    pub items: Vec<K::Item>,
    /// Frozen display fields.
    pub snapshot: K::Snapshot,
    /// Kind-specific fields.
    pub details: K::Details,
    /// Link expiry, for kinds that expire.
    pub expires_at: Option<DateTime<Utc>>,
    /// Staff member creating the record.
    pub created_by: StaffActor,
}

/// One workflow instance: state, response units and the token guarding it.
///
/// Records only move forward through their state machine. The token is
/// fixed for the record's lifetime apart from an explicit rotation, which
/// keeps the old value in `revoked_tokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct WorkflowRecord<K: WorkflowDefinition> {
    pub(super) id: WorkflowId,
    pub(super) token: AccessToken,
    pub(super) revoked_tokens: Vec<AccessToken>,
    pub(super) task_id: Option<TaskId>,
    pub(super) status: K::State,
    pub(super) items: Vec<K::Item>,
    pub(super) snapshot: K::Snapshot,
    pub(super) details: K::Details,
    pub(super) expires_at: Option<DateTime<Utc>>,
    pub(super) sent_at: Option<DateTime<Utc>>,
    pub(super) responded_at: Option<DateTime<Utc>>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
    pub(super) audit: AuditTrail,
}

impl<K: WorkflowDefinition> WorkflowRecord<K> {
    /// Creates a record.
    #[must_use]
    pub fn new(new: NewWorkflow<K>, now: DateTime<Utc>) -> Self {
        Self {
            id: WorkflowId::new(),
            token: new.token,
            revoked_tokens: Vec::new(),
            task_id: new.task_id,
            status: new.status,
            items: new.items,
            snapshot: new.snapshot,
            details: new.details,
            expires_at: new.expires_at,
            sent_at: None,
            responded_at: None,
            created_at: now,
            updated_at: now,
            audit: AuditTrail {
                created_by: Some(new.created_by),
                ..AuditTrail::default()
            },
        }
    }

    /// Returns the workflow kind.
    #[must_use]
    pub const fn kind(&self) -> WorkflowKind {
        K::KIND
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> WorkflowId {
        self.id
    }

    /// Returns the live access token.
    #[must_use]
    pub const fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Returns tokens retired by earlier rotations, oldest first.
    #[must_use]
    pub fn revoked_tokens(&self) -> &[AccessToken] {
        &self.revoked_tokens
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the stored state.
    #[must_use]
    pub const fn status(&self) -> K::State {
        self.status
    }

    /// Returns the response units in their original order.
    #[must_use]
    pub fn items(&self) -> &[K::Item] {
        &self.items
    }

    /// Returns the frozen display snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &K::Snapshot {
        &self.snapshot
    }

    /// Returns the kind-specific fields.
    #[must_use]
    pub const fn details(&self) -> &K::Details {
        &self.details
    }

    /// Returns the link expiry.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns when the link was last dispatched.
    #[must_use]
    pub const fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    /// Returns when the external party responded.
    #[must_use]
    pub const fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
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

    /// Returns the staff audit trail.
    #[must_use]
    pub const fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Returns whether a response has been recorded for the live token.
    #[must_use]
    pub const fn has_response(&self) -> bool {
        self.responded_at.is_some()
    }

    /// Returns whether the link has passed its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Returns whether the record blocks a new one for the same task.
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        K::is_open(self, now)
    }

    /// Records a dispatch of the link.
    pub fn mark_dispatched(&mut self, by: StaffActor, now: DateTime<Utc>) {
        self.sent_at = Some(now);
        self.updated_at = now;
        self.audit.sent_by = Some(by);
    }

    pub(super) fn transition(
        &mut self,
        next: K::State,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(WorkflowDomainError::InvalidTransition {
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Retires the live token and installs a new one.
    pub(super) fn rotate_token(&mut self, token: AccessToken, now: DateTime<Utc>) {
        let retired = std::mem::replace(&mut self.token, token);
        self.revoked_tokens.push(retired);
        self.updated_at = now;
    }
}
