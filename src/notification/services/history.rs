//! Read access to the communication ledger.

use std::sync::Arc;

use crate::notification::{
    domain::{ContactSummary, LedgerEntry},
    ports::{CommunicationLedger, LedgerResult},
};
use crate::task::domain::TaskId;

/// Lists delivery attempts and derives contact indicators.
#[derive(Clone)]
pub struct CommunicationHistory {
    ledger: Arc<dyn CommunicationLedger>,
}

impl CommunicationHistory {
    /// Creates a history reader over a ledger.
    #[must_use]
    pub fn new(ledger: Arc<dyn CommunicationLedger>) -> Self {
        Self { ledger }
    }

    /// Lists entries newest first, for one task or across all tasks.
    ///
    /// # Errors
    ///
    /// Returns the ledger error when the read fails.
    pub async fn list(
        &self,
        task_id: Option<TaskId>,
        limit: usize,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        match task_id {
            Some(id) => self.ledger.list_for_task(id, limit).await,
            None => self.ledger.list_recent(limit).await,
        }
    }

    /// Summarises whether the customer of a task has been reached.
    ///
    /// # Errors
    ///
    /// Returns the ledger error when the read fails.
    pub async fn contact_summary(&self, task_id: TaskId) -> LedgerResult<ContactSummary> {
        let entries = self.ledger.list_for_task(task_id, usize::MAX).await?;
        Ok(ContactSummary::from_entries(&entries))
    }
}
