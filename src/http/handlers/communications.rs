//! Communication ledger listing.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use crate::http::{ApiResult, AppState, StaffIdentity, StaffRole};
use crate::notification::domain::{ContactSummary, LedgerEntry};
use crate::task::domain::TaskId;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    task_id: Option<TaskId>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListBody {
    entries: Vec<LedgerEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ContactSummary>,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    staff: StaffIdentity,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<ListBody>> {
    staff.require(StaffRole::ANY)?;
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let entries = state.history.list(query.task_id, limit).await?;
    let summary = match query.task_id {
        Some(task_id) => Some(state.history.contact_summary(task_id).await?),
        None => None,
    };
    Ok(Json(ListBody { entries, summary }))
}
