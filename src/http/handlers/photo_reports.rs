//! Photo report routes.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SentBody;
use crate::http::{ApiError, ApiResult, AppState, StaffIdentity, StaffRole};
use crate::task::domain::TaskId;
use crate::workflow::{
    domain::{
        DamageDecision, DamageDraft, DamageEntry, DamageVerdict, DraftUpdate, PhotoReport,
        PhotoReportRecord, PhotoReportStatus, PhotoReview, ReportContact, WorkflowId,
    },
    services::{CreatePhotoReport, PublicPhotoReport, TaskDisplay},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateBody {
    task_id: Option<TaskId>,
    #[serde(flatten)]
    contact: ReportContact,
    notes: Option<String>,
    #[serde(default)]
    damages: Vec<DamageDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateBody {
    #[serde(flatten)]
    contact: ReportContact,
    notes: Option<String>,
    damages: Option<Vec<DamageDraft>>,
}

impl From<UpdateBody> for DraftUpdate {
    fn from(body: UpdateBody) -> Self {
        let contact = (body.contact != ReportContact::default()).then_some(body.contact);
        Self {
            contact,
            notes: body.notes,
            damages: body.damages,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    task_id: TaskId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DecisionBody {
    id: String,
    status: DamageVerdict,
    customer_note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitBody {
    #[serde(default)]
    damages: Vec<DecisionBody>,
    signature: Option<String>,
    reviewer_name: Option<String>,
}

/// Report as shown to the customer; the token is left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PublicReportView {
    id: WorkflowId,
    status: PhotoReportStatus,
    #[serde(flatten)]
    contact: ReportContact,
    notes: Option<String>,
    damages: Vec<DamageEntry>,
    reviewer_name: Option<String>,
    sent_at: Option<DateTime<Utc>>,
    reviewed_at: Option<DateTime<Utc>>,
    task: Option<TaskDisplay>,
}

impl From<PublicPhotoReport> for PublicReportView {
    fn from(public: PublicPhotoReport) -> Self {
        let PublicPhotoReport { report, task } = public;
        Self {
            id: report.id(),
            status: report.status(),
            contact: report.snapshot().clone(),
            notes: report.details().notes.clone(),
            damages: report.items().to_vec(),
            reviewer_name: report.details().reviewer_name.clone(),
            sent_at: report.sent_at(),
            reviewed_at: report.responded_at(),
            task,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmittedBody {
    success: bool,
    approved_count: usize,
    total_count: usize,
    reviewed_at: DateTime<Utc>,
}

pub(crate) async fn create(
    State(state): State<AppState>,
    staff: StaffIdentity,
    payload: Result<Json<CreateBody>, JsonRejection>,
) -> ApiResult<Json<PhotoReportRecord>> {
    let actor = staff.require(StaffRole::ANY)?;
    let Json(body) = payload?;
    let request = CreatePhotoReport {
        task_id: body.task_id,
        contact: body.contact,
        notes: body.notes,
        damages: body.damages,
    };
    Ok(Json(state.photo_reports.create_draft(request, actor).await?))
}

pub(crate) async fn list(
    State(state): State<AppState>,
    staff: StaffIdentity,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<PhotoReportRecord>>> {
    staff.require(StaffRole::ANY)?;
    let Query(query) = query?;
    Ok(Json(state.photo_reports.list_for_task(query.task_id).await?))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    staff: StaffIdentity,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Json<PhotoReportRecord>> {
    staff.require(StaffRole::ANY)?;
    Ok(Json(state.photo_reports.get(id).await?))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    staff: StaffIdentity,
    Path(id): Path<WorkflowId>,
    payload: Result<Json<UpdateBody>, JsonRejection>,
) -> ApiResult<Json<PhotoReportRecord>> {
    let actor = staff.require(StaffRole::ANY)?;
    let Json(body) = payload?;
    let record = state
        .photo_reports
        .update_draft(id, body.into(), actor)
        .await?;
    Ok(Json(record))
}

pub(crate) async fn send(
    State(state): State<AppState>,
    staff: StaffIdentity,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Json<SentBody<PhotoReport>>> {
    let actor = staff.require(StaffRole::ANY)?;
    let outcome = state.photo_reports.send(id, actor).await?;
    Ok(Json(outcome.into()))
}

pub(crate) async fn reset(
    State(state): State<AppState>,
    staff: StaffIdentity,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Json<PhotoReportRecord>> {
    let actor = staff.require(StaffRole::ANY)?;
    Ok(Json(state.photo_reports.reset(id, actor).await?))
}

pub(crate) async fn public_fetch(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<PublicReportView>> {
    let public = state.photo_reports.public_fetch(&token).await?;
    Ok(Json(public.into()))
}

pub(crate) async fn submit(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Result<Json<SubmitBody>, JsonRejection>,
) -> ApiResult<Json<SubmittedBody>> {
    let Json(body) = payload?;
    let decisions = body
        .damages
        .into_iter()
        .map(|decision| DamageDecision {
            id: decision.id,
            verdict: decision.status,
            note: decision.customer_note,
        })
        .collect();
    let review =
        PhotoReview::new(decisions, body.signature, body.reviewer_name).map_err(ApiError::from)?;
    let receipt = state.photo_reports.submit_review(&token, review).await?;
    Ok(Json(SubmittedBody {
        success: true,
        approved_count: receipt.tally.approved_count,
        total_count: receipt.tally.total_count,
        reviewed_at: receipt.reviewed_at,
    }))
}
