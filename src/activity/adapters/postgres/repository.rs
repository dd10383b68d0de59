//! `PostgreSQL` activity log implementation.

use super::{models::ActivityRow, schema::activity_logs};
use crate::activity::{
    domain::{ActivityAction, ActivityEntry, ActivityEntryId, Actor, EntityType},
    ports::{ActivityLog, ActivityLogError, ActivityLogResult},
};
use crate::task::{adapters::postgres::TaskPgPool, domain::TaskId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

/// `PostgreSQL`-backed activity log.
#[derive(Debug, Clone)]
pub struct PostgresActivityLog {
    pool: TaskPgPool,
}

impl PostgresActivityLog {
    /// Creates a new log from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ActivityLogResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ActivityLogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ActivityLogError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ActivityLogError::persistence)?
    }
}

#[async_trait]
impl ActivityLog for PostgresActivityLog {
    async fn append(&self, entry: &ActivityEntry) -> ActivityLogResult<()> {
        let row = to_row(entry)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(activity_logs::table)
                .values(&row)
                .execute(connection)
                .map_err(ActivityLogError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId) -> ActivityLogResult<Vec<ActivityEntry>> {
        self.run_blocking(move |connection| {
            let rows = activity_logs::table
                .filter(activity_logs::task_id.eq(task_id.into_inner()))
                .order(activity_logs::created_at.desc())
                .select(ActivityRow::as_select())
                .load::<ActivityRow>(connection)
                .map_err(ActivityLogError::persistence)?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }
}

fn to_row(entry: &ActivityEntry) -> ActivityLogResult<ActivityRow> {
    Ok(ActivityRow {
        id: entry.id.into_inner(),
        entity_type: entry.entity_type.as_str().to_owned(),
        entity_id: entry.entity_id,
        task_id: entry.task_id.map(TaskId::into_inner),
        action: entry.action.as_str().to_owned(),
        description: entry.description.clone(),
        actor: serde_json::to_value(&entry.actor).map_err(ActivityLogError::persistence)?,
        details: entry.details.clone(),
        created_at: entry.created_at,
    })
}

fn from_row(row: ActivityRow) -> ActivityLogResult<ActivityEntry> {
    let action =
        ActivityAction::try_from(row.action.as_str()).map_err(ActivityLogError::persistence)?;
    let entity_type = if row.entity_type == EntityType::PhotoReport.as_str() {
        EntityType::PhotoReport
    } else {
        EntityType::Task
    };
    let actor =
        serde_json::from_value::<Actor>(row.actor).map_err(ActivityLogError::persistence)?;
    Ok(ActivityEntry {
        id: ActivityEntryId::from_uuid(row.id),
        entity_type,
        entity_id: row.entity_id,
        task_id: row.task_id.map(TaskId::from_uuid),
        action,
        description: row.description,
        actor,
        details: row.details,
        created_at: row.created_at,
    })
}
