//! Errors returned by the workflow services.

use thiserror::Error;

use crate::notification::{domain::NotificationDomainError, services::TemplateError};
use crate::task::{
    domain::TaskId,
    ports::{ContactDirectoryError, TaskStoreError},
};
use crate::workflow::{
    domain::{WorkflowDomainError, WorkflowId, WorkflowKind},
    ports::WorkflowStoreError,
};

/// Result type for workflow service operations.
pub type WorkflowServiceResult<T> = Result<T, WorkflowServiceError>;

/// Errors returned by the workflow services.
///
/// Delivery failures never appear here; they are reported per channel
/// alongside a successful result.
#[derive(Debug, Error)]
pub enum WorkflowServiceError {
    /// Unknown token, record or task-level workflow.
    #[error("{0} not found")]
    NotFound(String),

    /// The access link has expired.
    #[error("the link has expired")]
    Expired,

    /// The record already holds a response.
    #[error("a response has already been recorded")]
    AlreadyResponded,

    /// A concurrent write moved the record on.
    #[error("the record changed concurrently and is now {current_status}")]
    Conflict {
        /// State the record is now in.
        current_status: String,
    },

    /// A precondition for the operation does not hold.
    #[error("{0}")]
    PreconditionFailed(String),

    /// Another record of the same kind is still open for the task.
    #[error("an open {} already exists for the task: {existing}", kind.as_str())]
    AlreadyOpen {
        /// Workflow kind.
        kind: WorkflowKind,
        /// The open record.
        existing: WorkflowId,
    },

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A freshly issued token collided with an existing one.
    #[error("access token collision")]
    TokenCollision,

    /// State machine or validation failure.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),

    /// Message content could not be built.
    #[error(transparent)]
    Message(#[from] NotificationDomainError),

    /// Template rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Workflow persistence failure.
    #[error(transparent)]
    Store(WorkflowStoreError),

    /// Task store failure.
    #[error(transparent)]
    Task(TaskStoreError),

    /// Contact directory failure.
    #[error(transparent)]
    Directory(#[from] ContactDirectoryError),
}

impl From<WorkflowStoreError> for WorkflowServiceError {
    fn from(err: WorkflowStoreError) -> Self {
        match err {
            WorkflowStoreError::NotFound(id) => Self::NotFound(format!("workflow record {id}")),
            WorkflowStoreError::Conflict {
                responded: true, ..
            } => Self::AlreadyResponded,
            WorkflowStoreError::Conflict { current_status, .. } => {
                Self::Conflict { current_status }
            }
            WorkflowStoreError::DuplicateToken => Self::TokenCollision,
            other @ WorkflowStoreError::Persistence(_) => Self::Store(other),
        }
    }
}

impl From<TaskStoreError> for WorkflowServiceError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::NotFound(id) => Self::TaskNotFound(id),
            other @ TaskStoreError::Persistence(_) => Self::Task(other),
        }
    }
}
