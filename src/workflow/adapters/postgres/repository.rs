//! `PostgreSQL` workflow store implementation.

use super::{models::WorkflowRow, schema::workflow_records};
use crate::task::{adapters::postgres::TaskPgPool, domain::TaskId};
use crate::workflow::{
    domain::{AccessToken, WorkflowId, WorkflowKind},
    ports::{StoredWorkflow, UpdateGuard, WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed workflow store.
#[derive(Debug, Clone)]
pub struct PostgresWorkflowStore {
    pool: TaskPgPool,
}

impl PostgresWorkflowStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkflowStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkflowStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkflowStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkflowStoreError::persistence)?
    }
}

#[async_trait]
impl WorkflowStore for PostgresWorkflowStore {
    async fn insert(&self, record: &StoredWorkflow) -> WorkflowStoreResult<()> {
        let row = to_row(record);
        self.run_blocking(move |connection| {
            diesel::insert_into(workflow_records::table)
                .values(&row)
                .execute(connection)
                .map_err(map_write_error)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        kind: WorkflowKind,
        id: WorkflowId,
    ) -> WorkflowStoreResult<Option<StoredWorkflow>> {
        self.run_blocking(move |connection| {
            let row = workflow_records::table
                .filter(workflow_records::id.eq(id.into_inner()))
                .filter(workflow_records::kind.eq(kind.as_str()))
                .select(WorkflowRow::as_select())
                .first::<WorkflowRow>(connection)
                .optional()
                .map_err(WorkflowStoreError::persistence)?;
            row.map(from_row).transpose()
        })
        .await
    }

    async fn find_by_token(
        &self,
        kind: WorkflowKind,
        token: &str,
    ) -> WorkflowStoreResult<Option<StoredWorkflow>> {
        let lookup = token.to_owned();
        self.run_blocking(move |connection| {
            let row = workflow_records::table
                .filter(workflow_records::token.eq(lookup))
                .filter(workflow_records::kind.eq(kind.as_str()))
                .select(WorkflowRow::as_select())
                .first::<WorkflowRow>(connection)
                .optional()
                .map_err(WorkflowStoreError::persistence)?;
            row.map(from_row).transpose()
        })
        .await
    }

    async fn list_for_task(
        &self,
        kind: WorkflowKind,
        task_id: TaskId,
    ) -> WorkflowStoreResult<Vec<StoredWorkflow>> {
        self.run_blocking(move |connection| {
            let rows = workflow_records::table
                .filter(workflow_records::task_id.eq(task_id.into_inner()))
                .filter(workflow_records::kind.eq(kind.as_str()))
                .order(workflow_records::created_at.desc())
                .select(WorkflowRow::as_select())
                .load::<WorkflowRow>(connection)
                .map_err(WorkflowStoreError::persistence)?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }

    async fn replace_if(
        &self,
        record: &StoredWorkflow,
        guard: &UpdateGuard,
    ) -> WorkflowStoreResult<()> {
        let row = to_row(record);
        let expected_token = guard.expected_token.as_str().to_owned();
        let allowed_statuses = guard.allowed_statuses.clone();
        let allowed_responded = if guard.require_unresponded {
            vec![false]
        } else {
            vec![false, true]
        };
        self.run_blocking(move |connection| {
            let target = workflow_records::table
                .filter(workflow_records::id.eq(row.id))
                .filter(workflow_records::kind.eq(&row.kind))
                .filter(workflow_records::token.eq(expected_token))
                .filter(workflow_records::status.eq_any(allowed_statuses))
                .filter(workflow_records::responded.eq_any(allowed_responded));
            let updated = diesel::update(target)
                .set((
                    workflow_records::token.eq(&row.token),
                    workflow_records::status.eq(&row.status),
                    workflow_records::responded.eq(row.responded),
                    workflow_records::document.eq(&row.document),
                    workflow_records::updated_at.eq(row.updated_at),
                ))
                .execute(connection)
                .map_err(map_write_error)?;
            if updated == 1 {
                return Ok(());
            }

            // Nothing matched: tell a missing record apart from a lost race.
            let current = workflow_records::table
                .filter(workflow_records::id.eq(row.id))
                .filter(workflow_records::kind.eq(&row.kind))
                .select((workflow_records::status, workflow_records::responded))
                .first::<(String, bool)>(connection)
                .optional()
                .map_err(WorkflowStoreError::persistence)?;
            match current {
                Some((current_status, responded)) => Err(WorkflowStoreError::Conflict {
                    current_status,
                    responded,
                }),
                None => Err(WorkflowStoreError::NotFound(WorkflowId::from_uuid(row.id))),
            }
        })
        .await
    }
}

fn map_write_error(err: DieselError) -> WorkflowStoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            WorkflowStoreError::DuplicateToken
        }
        other => WorkflowStoreError::persistence(other),
    }
}

fn to_row(record: &StoredWorkflow) -> WorkflowRow {
    WorkflowRow {
        id: record.id.into_inner(),
        kind: record.kind.as_str().to_owned(),
        token: record.token.as_str().to_owned(),
        task_id: record.task_id.map(TaskId::into_inner),
        status: record.status.clone(),
        responded: record.responded,
        document: record.document.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn from_row(row: WorkflowRow) -> WorkflowStoreResult<StoredWorkflow> {
    let WorkflowRow {
        id,
        kind: persisted_kind,
        token,
        task_id,
        status,
        responded,
        document,
        created_at,
        updated_at,
    } = row;
    let kind =
        WorkflowKind::try_from(persisted_kind.as_str()).map_err(WorkflowStoreError::persistence)?;
    Ok(StoredWorkflow {
        id: WorkflowId::from_uuid(id),
        kind,
        token: AccessToken::new(token),
        task_id: task_id.map(TaskId::from_uuid),
        status,
        responded,
        document,
        created_at,
        updated_at,
    })
}
