//! `PostgreSQL` ledger implementation.

use super::{models::LedgerRow, schema::communication_ledger};
use crate::notification::{
    domain::{Channel, DeliveryStatus, LedgerEntry, LedgerEntryId, LedgerReference},
    ports::{CommunicationLedger, LedgerError, LedgerResult},
};
use crate::task::{adapters::postgres::TaskPgPool, domain::TaskId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

/// `PostgreSQL`-backed communication ledger.
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: TaskPgPool,
}

impl PostgresLedger {
    /// Creates a new ledger from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut PgConnection) -> LedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(LedgerError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(LedgerError::persistence)?
    }
}

#[async_trait]
impl CommunicationLedger for PostgresLedger {
    async fn append(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        let row = to_row(entry);
        self.run_blocking(move |connection| {
            diesel::insert_into(communication_ledger::table)
                .values(&row)
                .execute(connection)
                .map_err(LedgerError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId, limit: usize) -> LedgerResult<Vec<LedgerEntry>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run_blocking(move |connection| {
            let rows = communication_ledger::table
                .filter(communication_ledger::task_id.eq(task_id.into_inner()))
                .order(communication_ledger::created_at.desc())
                .limit(row_limit)
                .select(LedgerRow::as_select())
                .load::<LedgerRow>(connection)
                .map_err(LedgerError::persistence)?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }

    async fn list_for_workflow(&self, workflow_id: Uuid) -> LedgerResult<Vec<LedgerEntry>> {
        self.run_blocking(move |connection| {
            let rows = communication_ledger::table
                .filter(communication_ledger::workflow_id.eq(workflow_id))
                .order(communication_ledger::created_at.desc())
                .select(LedgerRow::as_select())
                .load::<LedgerRow>(connection)
                .map_err(LedgerError::persistence)?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }

    async fn list_recent(&self, limit: usize) -> LedgerResult<Vec<LedgerEntry>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run_blocking(move |connection| {
            let rows = communication_ledger::table
                .order(communication_ledger::created_at.desc())
                .limit(row_limit)
                .select(LedgerRow::as_select())
                .load::<LedgerRow>(connection)
                .map_err(LedgerError::persistence)?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }
}

fn to_row(entry: &LedgerEntry) -> LedgerRow {
    LedgerRow {
        id: entry.id.into_inner(),
        channel: entry.channel.as_str().to_owned(),
        recipient: entry.to.clone(),
        status: entry.status.as_str().to_owned(),
        error: entry.error.clone(),
        provider_id: entry.provider_id.clone(),
        summary: entry.summary.clone(),
        task_id: entry.reference.task_id.map(TaskId::into_inner),
        workflow_id: entry.reference.workflow_id,
        workflow_kind: entry.reference.workflow_kind.clone(),
        created_at: entry.created_at,
        sent_at: entry.sent_at,
    }
}

fn from_row(row: LedgerRow) -> LedgerResult<LedgerEntry> {
    let channel = Channel::try_from(row.channel.as_str()).map_err(LedgerError::persistence)?;
    let status = DeliveryStatus::try_from(row.status.as_str()).map_err(LedgerError::persistence)?;
    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(row.id),
        channel,
        to: row.recipient,
        status,
        error: row.error,
        provider_id: row.provider_id,
        summary: row.summary,
        reference: LedgerReference {
            task_id: row.task_id.map(TaskId::from_uuid),
            workflow_id: row.workflow_id,
            workflow_kind: row.workflow_kind,
        },
        created_at: row.created_at,
        sent_at: row.sent_at,
    })
}
