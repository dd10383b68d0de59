//! Append-only communication ledger port.

use crate::notification::domain::LedgerEntry;
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger persistence contract. Entries are never mutated or removed.
#[async_trait]
pub trait CommunicationLedger: Send + Sync {
    /// Appends an entry.
    async fn append(&self, entry: &LedgerEntry) -> LedgerResult<()>;

    /// Lists entries for a task, newest first, at most `limit`.
    async fn list_for_task(&self, task_id: TaskId, limit: usize) -> LedgerResult<Vec<LedgerEntry>>;

    /// Lists entries for a workflow record, newest first.
    async fn list_for_workflow(&self, workflow_id: Uuid) -> LedgerResult<Vec<LedgerEntry>>;

    /// Lists the most recent entries across all tasks.
    async fn list_recent(&self, limit: usize) -> LedgerResult<Vec<LedgerEntry>>;
}

/// Errors returned by ledger implementations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
