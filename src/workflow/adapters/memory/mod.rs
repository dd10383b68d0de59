//! In-memory workflow store.
//!
//! Conditional writes check their guard and replace the record under one
//! write lock, so concurrent responders see exactly one winner.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::domain::TaskId;
use crate::workflow::{
    domain::{WorkflowId, WorkflowKind},
    ports::{StoredWorkflow, UpdateGuard, WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
};

/// Thread-safe in-memory workflow store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    state: Arc<RwLock<HashMap<WorkflowId, StoredWorkflow>>>,
}

impl InMemoryWorkflowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl ToString) -> WorkflowStoreError {
    WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn insert(&self, record: &StoredWorkflow) -> WorkflowStoreResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        if state.values().any(|stored| stored.token == record.token) {
            return Err(WorkflowStoreError::DuplicateToken);
        }
        state.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        kind: WorkflowKind,
        id: WorkflowId,
    ) -> WorkflowStoreResult<Option<StoredWorkflow>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.get(&id).filter(|stored| stored.kind == kind).cloned())
    }

    async fn find_by_token(
        &self,
        kind: WorkflowKind,
        token: &str,
    ) -> WorkflowStoreResult<Option<StoredWorkflow>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state
            .values()
            .find(|stored| stored.kind == kind && stored.token.as_str() == token)
            .cloned())
    }

    async fn list_for_task(
        &self,
        kind: WorkflowKind,
        task_id: TaskId,
    ) -> WorkflowStoreResult<Vec<StoredWorkflow>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        let mut records: Vec<StoredWorkflow> = state
            .values()
            .filter(|stored| stored.kind == kind && stored.task_id == Some(task_id))
            .cloned()
            .collect();
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(records)
    }

    async fn replace_if(
        &self,
        record: &StoredWorkflow,
        guard: &UpdateGuard,
    ) -> WorkflowStoreResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        if record.token != guard.expected_token
            && state
                .values()
                .any(|stored| stored.id != record.id && stored.token == record.token)
        {
            return Err(WorkflowStoreError::DuplicateToken);
        }
        let current = state
            .get_mut(&record.id)
            .filter(|stored| stored.kind == record.kind)
            .ok_or(WorkflowStoreError::NotFound(record.id))?;
        let guard_holds = current.token == guard.expected_token
            && guard.allowed_statuses.contains(&current.status)
            && !(guard.require_unresponded && current.responded);
        if !guard_holds {
            return Err(WorkflowStoreError::Conflict {
                current_status: current.status.clone(),
                responded: current.responded,
            });
        }
        *current = record.clone();
        Ok(())
    }
}
