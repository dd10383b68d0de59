//! Store port for workflow records.
//!
//! The store sees records as documents with a handful of indexed columns.
//! Every state change goes through [`WorkflowStore::replace_if`], a single
//! conditional write that only succeeds while the record still carries the
//! expected token, status and response flag.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::task::domain::TaskId;
use crate::workflow::domain::{
    AccessToken, WorkflowDefinition, WorkflowId, WorkflowKind, WorkflowRecord, WorkflowState,
};

/// Result type for workflow store operations.
pub type WorkflowStoreResult<T> = Result<T, WorkflowStoreError>;

/// A workflow record as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredWorkflow {
    /// Record identifier.
    pub id: WorkflowId,
    /// Workflow kind.
    pub kind: WorkflowKind,
    /// Live access token. Unique across all kinds.
    pub token: AccessToken,
    /// Owning task.
    pub task_id: Option<TaskId>,
    /// State code.
    pub status: String,
    /// Whether a response is recorded for the live token.
    pub responded: bool,
    /// Full record document.
    pub document: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl StoredWorkflow {
    /// Serialises a typed record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::Persistence`] when serialisation fails.
    pub fn from_record<K: WorkflowDefinition>(
        record: &WorkflowRecord<K>,
    ) -> WorkflowStoreResult<Self> {
        let document = serde_json::to_value(record).map_err(WorkflowStoreError::persistence)?;
        Ok(Self {
            id: record.id(),
            kind: K::KIND,
            token: record.token().clone(),
            task_id: record.task_id(),
            status: record.status().as_str().to_owned(),
            responded: record.has_response(),
            document,
            created_at: record.created_at(),
            updated_at: record.updated_at(),
        })
    }

    /// Deserialises the typed record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::Persistence`] when the document belongs
    /// to another kind or does not match the record shape.
    pub fn into_record<K: WorkflowDefinition>(self) -> WorkflowStoreResult<WorkflowRecord<K>> {
        if self.kind != K::KIND {
            return Err(WorkflowStoreError::persistence(std::io::Error::other(
                format!(
                    "record {} is a {} record, not {}",
                    self.id,
                    self.kind.as_str(),
                    K::KIND.as_str()
                ),
            )));
        }
        serde_json::from_value(self.document).map_err(WorkflowStoreError::persistence)
    }
}

/// Preconditions a conditional write checks against the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateGuard {
    /// Token the stored record must still carry.
    pub expected_token: AccessToken,
    /// States the stored record may be in.
    pub allowed_statuses: Vec<String>,
    /// Whether the stored record must not have a response yet.
    pub require_unresponded: bool,
}

/// Persistence contract for workflow records.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::DuplicateToken`] when any record of any
    /// kind already uses the token.
    async fn insert(&self, record: &StoredWorkflow) -> WorkflowStoreResult<()>;

    /// Finds a record by identifier.
    async fn find_by_id(
        &self,
        kind: WorkflowKind,
        id: WorkflowId,
    ) -> WorkflowStoreResult<Option<StoredWorkflow>>;

    /// Finds a record by its live token. Retired tokens never match.
    async fn find_by_token(
        &self,
        kind: WorkflowKind,
        token: &str,
    ) -> WorkflowStoreResult<Option<StoredWorkflow>>;

    /// Lists a task's records of one kind, newest first.
    async fn list_for_task(
        &self,
        kind: WorkflowKind,
        task_id: TaskId,
    ) -> WorkflowStoreResult<Vec<StoredWorkflow>>;

    /// Replaces a record if the stored version still satisfies `guard`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::NotFound`] for an unknown record,
    /// [`WorkflowStoreError::Conflict`] when the guard no longer holds and
    /// [`WorkflowStoreError::DuplicateToken`] when a new token collides.
    async fn replace_if(
        &self,
        record: &StoredWorkflow,
        guard: &UpdateGuard,
    ) -> WorkflowStoreResult<()>;
}

/// Errors returned by workflow store implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowStoreError {
    /// The record was not found.
    #[error("workflow record not found: {0}")]
    NotFound(WorkflowId),

    /// The stored record changed since it was read.
    #[error("workflow record changed concurrently; now {current_status}")]
    Conflict {
        /// State code of the stored record.
        current_status: String,
        /// Whether the stored record has a response.
        responded: bool,
    },

    /// Another record already uses the token.
    #[error("access token already in use")]
    DuplicateToken,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
