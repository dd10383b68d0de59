//! Tests for activity entries and the in-memory log.

use crate::activity::{
    adapters::memory::InMemoryActivityLog,
    domain::{ActivityAction, ActivityEntry, Actor, EntityType, StaffActor},
    ports::ActivityLog,
};
use crate::task::domain::TaskId;
use chrono::{Duration, Utc};
use eyre::ensure;
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

#[rstest]
#[case(ActivityAction::OrderConfirmationSent)]
#[case(ActivityAction::BygherreFinalConfirmation)]
#[case(ActivityAction::PhotoReportReset)]
fn action_codes_parse_back(#[case] action: ActivityAction) {
    assert_eq!(ActivityAction::try_from(action.as_str()), Ok(action));
}

#[rstest]
fn actor_display_name_prefers_identity() {
    let staff = Actor::Staff(StaffActor::new("u-1", "Mette"));
    let external = Actor::external("kunde@example.com");
    assert_eq!(staff.display_name(), "Mette");
    assert_eq!(external.display_name(), "kunde@example.com");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_for_task_returns_newest_first_and_filters() -> eyre::Result<()> {
    let log = InMemoryActivityLog::new();
    let task_id = TaskId::new();
    let now = Utc::now();
    let first = ActivityEntry::for_task(
        task_id,
        ActivityAction::OrderConfirmationSent,
        "Order confirmation sent",
        Actor::Staff(StaffActor::new("u-1", "Mette")),
        now,
    )
    .with_details(json!({ "sms": true }));
    let second = ActivityEntry::for_task(
        task_id,
        ActivityAction::OrderConfirmationResponse,
        "Customer answered",
        Actor::external("kunde@example.com"),
        now + Duration::minutes(5),
    );
    let unrelated = ActivityEntry::for_entity(
        EntityType::PhotoReport,
        Uuid::new_v4(),
        ActivityAction::PhotoReportCreated,
        "Draft created",
        Actor::external("Kunde"),
        now,
    );

    log.append(&first).await?;
    log.append(&unrelated).await?;
    log.append(&second).await?;

    let listed = log.list_for_task(task_id).await?;
    ensure!(listed == vec![second, first]);
    ensure!(log.entries()?.len() == 3);
    Ok(())
}
