//! Property-owner (bygherre) routes.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SentBody;
use crate::http::{ApiResult, AppState, StaffIdentity, StaffRole};
use crate::task::domain::TaskId;
use crate::workflow::{
    domain::{
        AccessMethod, Bygherre, BygherreAnswer, BygherrePublicView, BygherreRecord,
        BygherreStatus, CommunicationType, ProposedSlot, WorkflowId,
    },
    services::{ConfirmFinal, SendBygherre},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendBody {
    task_id: TaskId,
    #[serde(rename = "type")]
    communication_type: CommunicationType,
    #[serde(default)]
    proposed_dates: Vec<ProposedSlot>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RespondBody {
    confirmed: bool,
    #[serde(default)]
    selected_dates: Vec<usize>,
    access_method: Option<AccessMethod>,
    key_location: Option<String>,
    alternative_dates: Option<String>,
    remarks: Option<String>,
    phone: Option<String>,
}

impl From<RespondBody> for BygherreAnswer {
    fn from(body: RespondBody) -> Self {
        Self {
            confirmed: body.confirmed,
            selected_dates: body.selected_dates,
            access_method: body.access_method,
            key_location: body.key_location,
            alternative_dates: body.alternative_dates,
            remarks: body.remarks,
            phone: body.phone,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfirmFinalBody {
    confirmed_date: Option<NaiveDate>,
    confirmed_time_slot: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RespondedBody {
    success: bool,
    status: BygherreStatus,
}

pub(crate) async fn send(
    State(state): State<AppState>,
    staff: StaffIdentity,
    payload: Result<Json<SendBody>, JsonRejection>,
) -> ApiResult<Json<SentBody<Bygherre>>> {
    let actor = staff.require(StaffRole::ADMIN_ONLY)?;
    let Json(body) = payload?;
    let request = SendBygherre {
        task_id: body.task_id,
        communication_type: body.communication_type,
        proposed_dates: body.proposed_dates,
        message: body.message,
    };
    let outcome = state.bygherre.send(request, actor).await?;
    Ok(Json(outcome.into()))
}

pub(crate) async fn for_task(
    State(state): State<AppState>,
    staff: StaffIdentity,
    Path(task_id): Path<TaskId>,
) -> ApiResult<Json<Vec<BygherreRecord>>> {
    staff.require(StaffRole::ANY)?;
    Ok(Json(state.bygherre.list_for_task(task_id).await?))
}

pub(crate) async fn confirm_final(
    State(state): State<AppState>,
    staff: StaffIdentity,
    Path(id): Path<WorkflowId>,
    payload: Option<Json<ConfirmFinalBody>>,
) -> ApiResult<Json<SentBody<Bygherre>>> {
    let actor = staff.require(StaffRole::ADMIN_ONLY)?;
    let body = payload.map(|Json(body)| body).unwrap_or_default();
    let outcome = state
        .bygherre
        .confirm_final(
            id,
            ConfirmFinal {
                confirmed_date: body.confirmed_date,
                confirmed_time_slot: body.confirmed_time_slot,
            },
            actor,
        )
        .await?;
    Ok(Json(outcome.into()))
}

pub(crate) async fn public_fetch(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<BygherrePublicView>> {
    Ok(Json(state.bygherre.public_fetch(&token).await?))
}

pub(crate) async fn respond(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Result<Json<RespondBody>, JsonRejection>,
) -> ApiResult<Json<RespondedBody>> {
    let Json(body) = payload?;
    let record = state.bygherre.respond(&token, body.into()).await?;
    Ok(Json(RespondedBody {
        success: true,
        status: record.status(),
    }))
}
