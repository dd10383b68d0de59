//! Order confirmation routes.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NotificationLabels, SentBody};
use crate::http::{ApiError, ApiResult, AppState, StaffIdentity, StaffRole};
use crate::notification::domain::DeliveryReport;
use crate::task::domain::TaskId;
use crate::workflow::{
    domain::{
        ItemAnswer, LineItemType, OrderConfirmation, OrderConfirmationDetails,
        OrderConfirmationRecord, OrderConfirmationResponse, OrderConfirmationStatus,
        OrderLineItem, OrderOptions, OrderSnapshot, WorkflowId,
    },
    services::{ResendOrderConfirmation, SendOrderConfirmation, TestDelivery},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendBody {
    task_id: TaskId,
    #[serde(flatten)]
    options: OrderOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResendBody {
    task_id: TaskId,
    override_email: Option<String>,
    override_phone: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskBody {
    task_id: TaskId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestDeliveryBody {
    task_id: TaskId,
    email: Option<String>,
    phone: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerBody {
    #[serde(rename = "type")]
    item_type: LineItemType,
    accepted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RespondBody {
    #[serde(default)]
    items: Vec<AnswerBody>,
    overall_accepted: Option<bool>,
}

/// What the customer sees behind the link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PublicView {
    id: WorkflowId,
    status: OrderConfirmationStatus,
    items: Vec<OrderLineItem>,
    task_info: OrderSnapshot,
    #[serde(flatten)]
    details: OrderConfirmationDetails,
    expires_at: Option<DateTime<Utc>>,
    responded_at: Option<DateTime<Utc>>,
}

impl From<OrderConfirmationRecord> for PublicView {
    fn from(record: OrderConfirmationRecord) -> Self {
        Self {
            id: record.id(),
            status: record.status(),
            items: record.items().to_vec(),
            task_info: record.snapshot().clone(),
            details: record.details().clone(),
            expires_at: record.expires_at(),
            responded_at: record.responded_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RespondedBody {
    success: bool,
    status: OrderConfirmationStatus,
    overall_accepted: Option<bool>,
    summary: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SentTo {
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestDeliveryBodyOut {
    success: bool,
    public_url: String,
    sent_to: SentTo,
    notifications: NotificationLabels,
    delivery: DeliveryReport,
}

pub(crate) async fn send(
    State(state): State<AppState>,
    staff: StaffIdentity,
    payload: Result<Json<SendBody>, JsonRejection>,
) -> ApiResult<Json<SentBody<OrderConfirmation>>> {
    let actor = staff.require(StaffRole::ORDER_DESK)?;
    let Json(body) = payload?;
    let outcome = state
        .order_confirmations
        .send(
            SendOrderConfirmation {
                task_id: body.task_id,
                options: body.options,
            },
            actor,
        )
        .await?;
    Ok(Json(outcome.into()))
}

pub(crate) async fn resend(
    State(state): State<AppState>,
    staff: StaffIdentity,
    payload: Result<Json<ResendBody>, JsonRejection>,
) -> ApiResult<Json<SentBody<OrderConfirmation>>> {
    let actor = staff.require(StaffRole::ORDER_DESK)?;
    let Json(body) = payload?;
    let outcome = state
        .order_confirmations
        .resend(
            ResendOrderConfirmation {
                task_id: body.task_id,
                override_email: body.override_email,
                override_phone: body.override_phone,
                base_url: body.base_url,
            },
            actor,
        )
        .await?;
    Ok(Json(outcome.into()))
}

pub(crate) async fn activate(
    State(state): State<AppState>,
    staff: StaffIdentity,
    payload: Result<Json<TaskBody>, JsonRejection>,
) -> ApiResult<Json<OrderConfirmationRecord>> {
    let actor = staff.require(StaffRole::ORDER_DESK)?;
    let Json(body) = payload?;
    let record = state
        .order_confirmations
        .activate(body.task_id, actor)
        .await?;
    Ok(Json(record))
}

pub(crate) async fn test_delivery(
    State(state): State<AppState>,
    staff: StaffIdentity,
    payload: Result<Json<TestDeliveryBody>, JsonRejection>,
) -> ApiResult<Json<TestDeliveryBodyOut>> {
    let actor = staff.require(StaffRole::ORDER_DESK)?;
    let Json(body) = payload?;
    let outcome = state
        .order_confirmations
        .test_delivery(
            TestDelivery {
                task_id: body.task_id,
                email: body.email,
                phone: body.phone,
                base_url: body.base_url,
            },
            actor,
        )
        .await?;
    Ok(Json(TestDeliveryBodyOut {
        success: true,
        notifications: NotificationLabels::from(&outcome.delivery),
        public_url: outcome.public_url,
        sent_to: SentTo {
            email: outcome.sent_to.email,
            phone: outcome.sent_to.phone,
        },
        delivery: outcome.delivery,
    }))
}

pub(crate) async fn for_task(
    State(state): State<AppState>,
    staff: StaffIdentity,
    Path(task_id): Path<TaskId>,
) -> ApiResult<Json<OrderConfirmationRecord>> {
    staff.require(StaffRole::ANY)?;
    state
        .order_confirmations
        .find_for_task(task_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order confirmation for task {task_id}")))
}

pub(crate) async fn public_fetch(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<PublicView>> {
    let record = state.order_confirmations.public_fetch(&token).await?;
    Ok(Json(record.into()))
}

pub(crate) async fn respond(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Result<Json<RespondBody>, JsonRejection>,
) -> ApiResult<Json<RespondedBody>> {
    let Json(body) = payload?;
    let answers = body
        .items
        .into_iter()
        .map(|answer| ItemAnswer {
            item_type: answer.item_type,
            accepted: answer.accepted,
        })
        .collect();
    let response = OrderConfirmationResponse::new(answers, body.overall_accepted)
        .map_err(ApiError::from)?;
    let record = state
        .order_confirmations
        .respond(&token, &response)
        .await?;
    Ok(Json(RespondedBody {
        success: true,
        status: record.status(),
        overall_accepted: record.details().overall_accepted,
        summary: record.answer_summary(),
    }))
}
