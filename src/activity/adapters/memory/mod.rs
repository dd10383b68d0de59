//! In-memory activity log.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::activity::{
    domain::ActivityEntry,
    ports::{ActivityLog, ActivityLogError, ActivityLogResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory activity log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityLog {
    entries: Arc<RwLock<Vec<ActivityEntry>>>,
}

impl InMemoryActivityLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every entry in append order.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityLogError::Persistence`] when the lock is poisoned.
    pub fn entries(&self) -> ActivityLogResult<Vec<ActivityEntry>> {
        let entries = self.entries.read().map_err(|err| {
            ActivityLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(entries.clone())
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, entry: &ActivityEntry) -> ActivityLogResult<()> {
        let mut entries = self.entries.write().map_err(|err| {
            ActivityLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        entries.push(entry.clone());
        Ok(())
    }

    async fn list_for_task(&self, task_id: TaskId) -> ActivityLogResult<Vec<ActivityEntry>> {
        let entries = self.entries.read().map_err(|err| {
            ActivityLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(entries
            .iter()
            .rev()
            .filter(|entry| entry.task_id == Some(task_id))
            .cloned()
            .collect())
    }
}
