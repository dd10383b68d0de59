//! Append-only activity log port.

use crate::activity::domain::ActivityEntry;
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for activity log operations.
pub type ActivityLogResult<T> = Result<T, ActivityLogError>;

/// Activity log persistence contract.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Appends an entry. Entries are never updated or removed.
    async fn append(&self, entry: &ActivityEntry) -> ActivityLogResult<()>;

    /// Lists entries recorded for a task, newest first.
    async fn list_for_task(&self, task_id: TaskId) -> ActivityLogResult<Vec<ActivityEntry>>;
}

/// Errors returned by activity log implementations.
#[derive(Debug, Clone, Error)]
pub enum ActivityLogError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ActivityLogError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
