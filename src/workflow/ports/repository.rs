//! Typed access to workflow records of one kind.

use std::marker::PhantomData;
use std::sync::Arc;

use super::{StoredWorkflow, UpdateGuard, WorkflowStore, WorkflowStoreResult};
use crate::task::domain::TaskId;
use crate::workflow::domain::{
    AccessToken, WorkflowDefinition, WorkflowId, WorkflowRecord, WorkflowState,
};

/// Precondition for a typed conditional write.
#[derive(Debug, Clone)]
pub struct RecordGuard<K: WorkflowDefinition> {
    expected_token: AccessToken,
    allowed: Vec<K::State>,
    require_unresponded: bool,
}

impl<K: WorkflowDefinition> RecordGuard<K> {
    /// Guards a write against the record as it was read.
    ///
    /// Build the guard before mutating the record so it captures the
    /// token the write expects to replace.
    #[must_use]
    pub fn from_read(record: &WorkflowRecord<K>, allowed: &[K::State]) -> Self {
        Self {
            expected_token: record.token().clone(),
            allowed: allowed.to_vec(),
            require_unresponded: false,
        }
    }

    /// Guards a write on the exact state and response flag that were read.
    ///
    /// Use this for writes that replace a record which may legitimately be
    /// in several states; a response stored after the read fails the write
    /// instead of being overwritten.
    #[must_use]
    pub fn as_read(record: &WorkflowRecord<K>) -> Self {
        Self {
            expected_token: record.token().clone(),
            allowed: vec![record.status()],
            require_unresponded: !record.has_response(),
        }
    }

    /// Additionally requires that no response has been stored.
    #[must_use]
    pub fn unresponded(mut self) -> Self {
        self.require_unresponded = true;
        self
    }

    fn untyped(&self) -> UpdateGuard {
        UpdateGuard {
            expected_token: self.expected_token.clone(),
            allowed_statuses: self
                .allowed
                .iter()
                .map(|state| state.as_str().to_owned())
                .collect(),
            require_unresponded: self.require_unresponded,
        }
    }
}

/// Typed repository over a [`WorkflowStore`].
pub struct WorkflowRepository<K> {
    store: Arc<dyn WorkflowStore>,
    kind: PhantomData<fn() -> K>,
}

impl<K> Clone for WorkflowRepository<K> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            kind: PhantomData,
        }
    }
}

impl<K: WorkflowDefinition> WorkflowRepository<K> {
    /// Creates a repository backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self {
            store,
            kind: PhantomData,
        }
    }

    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including duplicate tokens.
    pub async fn insert(&self, record: &WorkflowRecord<K>) -> WorkflowStoreResult<()> {
        self.store.insert(&StoredWorkflow::from_record(record)?).await
    }

    /// Finds a record by identifier.
    ///
    /// # Errors
    ///
    /// Propagates store and decoding failures.
    pub async fn find_by_id(
        &self,
        id: WorkflowId,
    ) -> WorkflowStoreResult<Option<WorkflowRecord<K>>> {
        self.store
            .find_by_id(K::KIND, id)
            .await?
            .map(StoredWorkflow::into_record::<K>)
            .transpose()
    }

    /// Resolves a live token.
    ///
    /// # Errors
    ///
    /// Propagates store and decoding failures.
    pub async fn find_by_token(
        &self,
        token: &str,
    ) -> WorkflowStoreResult<Option<WorkflowRecord<K>>> {
        self.store
            .find_by_token(K::KIND, token)
            .await?
            .map(StoredWorkflow::into_record::<K>)
            .transpose()
    }

    /// Lists a task's records, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store and decoding failures.
    pub async fn list_for_task(
        &self,
        task_id: TaskId,
    ) -> WorkflowStoreResult<Vec<WorkflowRecord<K>>> {
        self.store
            .list_for_task(K::KIND, task_id)
            .await?
            .into_iter()
            .map(StoredWorkflow::into_record::<K>)
            .collect()
    }

    /// Writes `record` if the stored version still satisfies `guard`.
    ///
    /// # Errors
    ///
    /// Propagates store failures; see [`WorkflowStore::replace_if`].
    pub async fn replace_if(
        &self,
        record: &WorkflowRecord<K>,
        guard: &RecordGuard<K>,
    ) -> WorkflowStoreResult<()> {
        self.store
            .replace_if(&StoredWorkflow::from_record(record)?, &guard.untyped())
            .await
    }
}
