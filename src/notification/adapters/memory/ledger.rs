//! In-memory communication ledger.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::notification::{
    domain::LedgerEntry,
    ports::{CommunicationLedger, LedgerError, LedgerResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every entry in append order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the lock is poisoned.
    pub fn entries(&self) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.read_newest_first(|_| true)?.into_iter().rev().collect())
    }

    fn read_newest_first(
        &self,
        keep: impl Fn(&LedgerEntry) -> bool,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|err| LedgerError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(entries.iter().rev().filter(|entry| keep(entry)).cloned().collect())
    }
}

#[async_trait]
impl CommunicationLedger for InMemoryLedger {
    async fn append(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| LedgerError::persistence(std::io::Error::other(err.to_string())))?;
        entries.push(entry.clone());
        Ok(())
    }

    async fn list_for_task(&self, task_id: TaskId, limit: usize) -> LedgerResult<Vec<LedgerEntry>> {
        let mut entries = self.read_newest_first(|entry| entry.reference.task_id == Some(task_id))?;
        entries.truncate(limit);
        Ok(entries)
    }

    async fn list_for_workflow(&self, workflow_id: Uuid) -> LedgerResult<Vec<LedgerEntry>> {
        self.read_newest_first(|entry| entry.reference.workflow_id == Some(workflow_id))
    }

    async fn list_recent(&self, limit: usize) -> LedgerResult<Vec<LedgerEntry>> {
        let mut entries = self.read_newest_first(|_| true)?;
        entries.truncate(limit);
        Ok(entries)
    }
}
