//! `PostgreSQL` implementations of the task store and contact directory.

use super::{
    models::{ContactRow, TaskDetails, TaskRow},
    schema::{contacts, tasks},
};
use crate::task::{
    domain::{
        Contact, ContactId, PersistedTaskData, Task, TaskFieldWrite, TaskId, TaskStatus,
        WorkflowMirror,
    },
    ports::{
        ContactDirectory, ContactDirectoryError, ContactDirectoryResult, TaskStore,
        TaskStoreError, TaskStoreResult,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type shared by the portal adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
}

impl PostgresTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn apply(
        &self,
        id: TaskId,
        writes: &[TaskFieldWrite],
        at: DateTime<Utc>,
    ) -> TaskStoreResult<Task> {
        let pending = writes.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                let row = diesel::sql_query(concat!(
                    "SELECT id, task_number, status, details, workflow_mirror, created_at, ",
                    "updated_at FROM tasks WHERE id = $1 FOR UPDATE",
                ))
                .bind::<diesel::sql_types::Uuid, _>(id.into_inner())
                .get_result::<TaskRow>(tx)
                .optional()
                .map_err(TaskStoreError::persistence)?
                .ok_or(TaskStoreError::NotFound(id))?;

                let mut task = row_to_task(row)?;
                for write in &pending {
                    task.apply(write, at);
                }

                // Only the status bucket and the mirror column are written.
                let mirror =
                    serde_json::to_value(task.mirror()).map_err(TaskStoreError::persistence)?;
                diesel::update(tasks::table.filter(tasks::id.eq(id.into_inner())))
                    .set((
                        tasks::status.eq(task.status().as_str()),
                        tasks::workflow_mirror.eq(mirror),
                        tasks::updated_at.eq(at),
                    ))
                    .execute(tx)
                    .map_err(TaskStoreError::persistence)?;
                Ok(task)
            })
        })
        .await
    }
}

impl From<diesel::result::Error> for TaskStoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}

fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let TaskRow {
        id,
        task_number,
        status: persisted_status,
        details: persisted_details,
        workflow_mirror,
        created_at,
        updated_at,
    } = row;

    let status =
        TaskStatus::try_from(persisted_status.as_str()).map_err(TaskStoreError::persistence)?;
    let details = serde_json::from_value::<TaskDetails>(persisted_details)
        .map_err(TaskStoreError::persistence)?;
    let mirror = serde_json::from_value::<WorkflowMirror>(workflow_mirror)
        .map_err(TaskStoreError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        task_number,
        status,
        address: details.address,
        company_name: details.company_name,
        contact: details.contact,
        owners: details.owners,
        summary: details.summary,
        damages: details.damages,
        mirror,
        created_at,
        updated_at,
    }))
}

/// `PostgreSQL`-backed contact directory.
#[derive(Debug, Clone)]
pub struct PostgresContactDirectory {
    pool: TaskPgPool,
}

impl PostgresContactDirectory {
    /// Creates a new directory reader from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactDirectory for PostgresContactDirectory {
    async fn find_contact(&self, id: ContactId) -> ContactDirectoryResult<Option<Contact>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ContactDirectoryError::persistence)?;
            let row = contacts::table
                .filter(contacts::id.eq(id.into_inner()))
                .select(ContactRow::as_select())
                .first::<ContactRow>(&mut connection)
                .optional()
                .map_err(ContactDirectoryError::persistence)?;
            Ok(row.map(|contact| Contact {
                id: ContactId::from_uuid(contact.id),
                name: contact.name,
                email: contact.email,
                phone: contact.phone,
            }))
        })
        .await
        .map_err(ContactDirectoryError::persistence)?
    }
}
