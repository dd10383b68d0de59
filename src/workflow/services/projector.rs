//! Projection of workflow events onto task mirror fields.

use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

use crate::task::{
    domain::Task,
    ports::{TaskStore, TaskStoreResult},
};
use crate::workflow::domain::{WorkflowDefinition, WorkflowEvent, WorkflowRecord};

/// Translates workflow events into targeted task writes.
#[derive(Clone)]
pub struct TaskProjector {
    tasks: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl TaskProjector {
    /// Creates a projector writing through `tasks`.
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskStore>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { tasks, clock }
    }

    /// Applies the writes `event` produces for `record`.
    ///
    /// Returns the updated task, or `None` when the record has no task or
    /// the event writes nothing.
    ///
    /// # Errors
    ///
    /// Propagates task store failures.
    pub async fn project<K: WorkflowDefinition>(
        &self,
        record: &WorkflowRecord<K>,
        event: WorkflowEvent,
    ) -> TaskStoreResult<Option<Task>> {
        let Some(task_id) = record.task_id() else {
            return Ok(None);
        };
        let writes = K::task_writes(record, event);
        if writes.is_empty() {
            return Ok(None);
        }
        debug!(
            workflow_kind = K::KIND.as_str(),
            workflow_id = %record.id(),
            task_id = %task_id,
            writes = writes.len(),
            "projecting workflow event onto task"
        );
        self.tasks
            .apply(task_id, &writes, self.clock.utc())
            .await
            .map(Some)
    }
}
