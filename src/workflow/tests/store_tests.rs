//! Tests for the in-memory workflow store and the typed repository.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use eyre::{bail, ensure};
use rstest::{fixture, rstest};
use std::sync::Arc;

use crate::activity::domain::StaffActor;
use crate::task::domain::TaskId;
use crate::workflow::{
    adapters::memory::InMemoryWorkflowStore,
    domain::{
        AccessToken, DamageDraft, NewWorkflow, OrderConfirmation, OrderConfirmationDetails,
        OrderConfirmationRecord, OrderConfirmationStatus, OrderOptions, OrderSnapshot,
        PhotoReport, PhotoReportDetails, PhotoReportRecord, PhotoReportStatus, ReportContact,
        WorkflowKind,
    },
    ports::{
        RecordGuard, StoredWorkflow, WorkflowRepository, WorkflowStore, WorkflowStoreError,
    },
};

#[fixture]
fn store() -> Arc<InMemoryWorkflowStore> {
    Arc::new(InMemoryWorkflowStore::new())
}

fn at(hour: u32) -> eyre::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0)
        .single()
        .ok_or_else(|| eyre::eyre!("invalid hour {hour}"))
}

fn order(token: &str, task_id: Option<TaskId>, now: DateTime<Utc>) -> OrderConfirmationRecord {
    let options = OrderOptions::default();
    OrderConfirmationRecord::new(
        NewWorkflow {
            token: AccessToken::new(token),
            task_id,
            status: OrderConfirmationStatus::Sent,
            items: options.line_items(),
            snapshot: OrderSnapshot::default(),
            details: OrderConfirmationDetails {
                options,
                overall_accepted: None,
            },
            expires_at: Some(now + TimeDelta::days(14)),
            created_by: StaffActor::new("staff-1", "Mette Holm"),
        },
        now,
    )
}

fn report(token: &str, now: DateTime<Utc>) -> PhotoReportRecord {
    PhotoReportRecord::new(
        NewWorkflow {
            token: AccessToken::new(token),
            task_id: None,
            status: PhotoReportStatus::Draft,
            items: vec![DamageDraft::default().into_entry()],
            snapshot: ReportContact::default(),
            details: PhotoReportDetails::default(),
            expires_at: None,
            created_by: StaffActor::new("staff-1", "Mette Holm"),
        },
        now,
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tokens_are_unique_across_kinds(store: Arc<InMemoryWorkflowStore>) -> eyre::Result<()> {
    let now = at(9)?;
    let orders = WorkflowRepository::<OrderConfirmation>::new(store.clone());
    let reports = WorkflowRepository::<PhotoReport>::new(store.clone());
    orders.insert(&order("shared", None, now)).await?;

    let result = reports.insert(&report("shared", now)).await;

    ensure!(matches!(result, Err(WorkflowStoreError::DuplicateToken)));
    ensure!(reports.find_by_token("shared").await?.is_none());
    ensure!(orders.find_by_token("shared").await?.is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_guard_reports_the_stored_state(
    store: Arc<InMemoryWorkflowStore>,
) -> eyre::Result<()> {
    let now = at(9)?;
    let orders = WorkflowRepository::<OrderConfirmation>::new(store);
    let record = order("tok", None, now);
    orders.insert(&record).await?;

    let guard = RecordGuard::from_read(&record, &[OrderConfirmationStatus::Sent]).unresponded();
    let mut first = record.clone();
    first.activate(StaffActor::new("staff-1", "Mette Holm"), now)?;
    orders.replace_if(&first, &guard).await?;

    let mut second = record;
    second.expire(now)?;
    let result = orders.replace_if(&second, &guard).await;

    let Err(WorkflowStoreError::Conflict {
        current_status,
        responded,
    }) = result
    else {
        bail!("expected a conflict");
    };
    ensure!(current_status == "activated");
    ensure!(!responded);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rotated_tokens_stop_resolving(store: Arc<InMemoryWorkflowStore>) -> eyre::Result<()> {
    let now = at(9)?;
    let reports = WorkflowRepository::<PhotoReport>::new(store);
    let mut record = report("old", now);
    reports.insert(&record).await?;

    let guard = RecordGuard::from_read(&record, &[PhotoReportStatus::Draft]);
    record.reset(AccessToken::new("new"), at(10)?);
    reports.replace_if(&record, &guard).await?;

    ensure!(reports.find_by_token("old").await?.is_none());
    let Some(current) = reports.find_by_token("new").await? else {
        bail!("new token should resolve");
    };
    ensure!(current.revoked_tokens() == [AccessToken::new("old")]);

    // The retired token no longer matches the guard.
    let result = reports.replace_if(&record, &guard).await;
    ensure!(matches!(result, Err(WorkflowStoreError::Conflict { .. })));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rotation_cannot_steal_a_live_token(
    store: Arc<InMemoryWorkflowStore>,
) -> eyre::Result<()> {
    let now = at(9)?;
    let reports = WorkflowRepository::<PhotoReport>::new(store);
    reports.insert(&report("taken", now)).await?;
    let mut record = report("mine", now);
    reports.insert(&record).await?;

    let guard = RecordGuard::from_read(&record, &[PhotoReportStatus::Draft]);
    record.reset(AccessToken::new("taken"), now);

    ensure!(matches!(
        reports.replace_if(&record, &guard).await,
        Err(WorkflowStoreError::DuplicateToken)
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lists_newest_first_per_kind(store: Arc<InMemoryWorkflowStore>) -> eyre::Result<()> {
    let task_id = TaskId::new();
    let orders = WorkflowRepository::<OrderConfirmation>::new(store.clone());
    orders.insert(&order("a", Some(task_id), at(8)?)).await?;
    orders.insert(&order("b", Some(task_id), at(10)?)).await?;
    orders.insert(&order("c", Some(TaskId::new()), at(11)?)).await?;

    let listed = orders.list_for_task(task_id).await?;

    let tokens: Vec<&str> = listed.iter().map(|r| r.token().as_str()).collect();
    ensure!(tokens == ["b", "a"]);
    ensure!(
        store
            .list_for_task(WorkflowKind::PhotoReport, task_id)
            .await?
            .is_empty()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_document_is_kind_checked(store: Arc<InMemoryWorkflowStore>) -> eyre::Result<()> {
    let record = order("tok", None, at(9)?);
    let stored = StoredWorkflow::from_record(&record)?;
    store.insert(&stored).await?;

    ensure!(stored.status == "sent");
    ensure!(!stored.responded);
    ensure!(
        store
            .find_by_id(WorkflowKind::PhotoReport, record.id())
            .await?
            .is_none()
    );
    ensure!(matches!(
        stored.into_record::<PhotoReport>(),
        Err(WorkflowStoreError::Persistence(_))
    ));
    Ok(())
}
