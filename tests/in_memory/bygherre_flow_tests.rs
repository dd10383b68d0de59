//! Property-owner scheduling through the public service API.

use chrono::{NaiveDate, TimeDelta};
use confirmation_engine::workflow::{
    domain::{AccessMethod, BygherreAnswer, BygherreStatus, CommunicationType, ProposedSlot},
    services::{ConfirmFinal, SendBygherre, WorkflowServiceError},
};
use eyre::{bail, ensure};
use rstest::rstest;

use super::helpers::{Portal, portal, staff};

fn slot(day: u32, time_slot: &str) -> eyre::Result<ProposedSlot> {
    let date = NaiveDate::from_ymd_opt(2026, 5, day)
        .ok_or_else(|| eyre::eyre!("invalid day {day}"))?;
    Ok(ProposedSlot {
        date,
        time_slot: time_slot.to_owned(),
    })
}

fn three_slots() -> eyre::Result<Vec<ProposedSlot>> {
    Ok(vec![
        slot(18, "08-10")?,
        slot(19, "12-14")?,
        slot(20, "14-16")?,
    ])
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn indoor_answer_mirrors_the_proposed_slot(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let proposed = three_slots()?;
    let sent = portal
        .bygherre
        .send(
            SendBygherre {
                task_id,
                communication_type: CommunicationType::ScheduleIndoor,
                proposed_dates: proposed.clone(),
                message: Some("Vi skal ind i lejligheden".to_owned()),
            },
            &staff(),
        )
        .await?;
    ensure!(portal.sms.sent().len() == 1);
    let token = sent.record.token().as_str().to_owned();

    let view = portal.bygherre.public_fetch(&token).await?;
    ensure!(view.proposed_dates == proposed);
    ensure!(view.requires_access);
    ensure!(!view.has_responded);

    portal
        .bygherre
        .respond(
            &token,
            BygherreAnswer {
                confirmed: true,
                selected_dates: vec![1],
                access_method: Some(AccessMethod::Home),
                remarks: Some("Ring på ved ankomst".to_owned()),
                ..BygherreAnswer::default()
            },
        )
        .await?;

    let task = portal.task(task_id).await?;
    let Some(visit) = task.mirror().bygherre_confirmed_visit.clone() else {
        bail!("the selected slot should be mirrored onto the task");
    };
    let Some(expected) = proposed.get(1) else {
        bail!("three slots were proposed");
    };
    ensure!(visit.date == expected.date);
    ensure!(visit.time_slot == expected.time_slot);
    ensure!(!task.mirror().bygherre_comm_pending);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn final_confirmation_texts_the_owner_once(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let sent = portal
        .bygherre
        .send(
            SendBygherre {
                task_id,
                communication_type: CommunicationType::ScheduleIndoor,
                proposed_dates: three_slots()?,
                message: None,
            },
            &staff(),
        )
        .await?;
    let token = sent.record.token().as_str().to_owned();
    portal
        .bygherre
        .respond(
            &token,
            BygherreAnswer {
                confirmed: true,
                selected_dates: vec![2, 0],
                access_method: Some(AccessMethod::Key),
                key_location: Some("Hos naboen i nr. 6".to_owned()),
                ..BygherreAnswer::default()
            },
        )
        .await?;

    let confirmed = portal
        .bygherre
        .confirm_final(sent.record.id(), ConfirmFinal::default(), &staff())
        .await?;
    ensure!(confirmed.record.status() == BygherreStatus::Confirmed);
    ensure!(confirmed.record.details().confirmed_time_slot.as_deref() == Some("14-16"));
    ensure!(confirmed.delivery.sms_sent());
    ensure!(portal.sms.sent().len() == 2);

    let again = portal
        .bygherre
        .confirm_final(sent.record.id(), ConfirmFinal::default(), &staff())
        .await;
    ensure!(matches!(again, Err(WorkflowServiceError::Domain(_))));
    ensure!(portal.sms.sent().len() == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owners_answer_once(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let sent = portal
        .bygherre
        .send(
            SendBygherre {
                task_id,
                communication_type: CommunicationType::ScheduleOutdoor,
                proposed_dates: vec![slot(21, "10-12")?],
                message: None,
            },
            &staff(),
        )
        .await?;
    let token = sent.record.token().as_str().to_owned();
    let first = portal
        .bygherre
        .respond(
            &token,
            BygherreAnswer {
                confirmed: false,
                alternative_dates: Some("Uge 22".to_owned()),
                ..BygherreAnswer::default()
            },
        )
        .await?;
    ensure!(first.status() == BygherreStatus::Declined);

    let second = portal
        .bygherre
        .respond(
            &token,
            BygherreAnswer {
                confirmed: true,
                selected_dates: vec![0],
                ..BygherreAnswer::default()
            },
        )
        .await;
    ensure!(matches!(second, Err(WorkflowServiceError::AlreadyResponded)));

    let view = portal.bygherre.public_fetch(&token).await?;
    ensure!(view.status == BygherreStatus::Declined);
    ensure!(view.has_responded);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_listing_is_newest_first(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    portal
        .bygherre
        .send(
            SendBygherre {
                task_id,
                communication_type: CommunicationType::ConfirmTask,
                proposed_dates: Vec::new(),
                message: None,
            },
            &staff(),
        )
        .await?;
    portal.clock.advance(TimeDelta::minutes(5));
    portal
        .bygherre
        .send(
            SendBygherre {
                task_id,
                communication_type: CommunicationType::ScheduleOutdoor,
                proposed_dates: vec![slot(22, "08-14")?],
                message: None,
            },
            &staff(),
        )
        .await?;

    let listed: Vec<CommunicationType> = portal
        .bygherre
        .list_for_task(task_id)
        .await?
        .iter()
        .map(|record| record.details().communication_type)
        .collect();
    ensure!(listed == [CommunicationType::ScheduleOutdoor, CommunicationType::ConfirmTask]);
    Ok(())
}
