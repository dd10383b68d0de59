//! Order confirmation lifecycle through the public service API.

use chrono::TimeDelta;
use confirmation_engine::activity::domain::ActivityAction;
use confirmation_engine::task::domain::TaskStatus;
use confirmation_engine::workflow::{
    domain::{
        Acceptance, ItemAnswer, LineItemType, OrderConfirmationResponse, OrderConfirmationStatus,
        OrderOptions, ServiceZone,
    },
    services::{ResendOrderConfirmation, SendOrderConfirmation, WorkflowServiceError},
};
use eyre::{bail, ensure};
use rstest::rstest;

use super::helpers::{BASE_URL, Portal, portal, staff};

fn extended_with_glass() -> OrderOptions {
    OrderOptions {
        service_zone: ServiceZone::Extended,
        add_glass_risk: true,
        ..OrderOptions::default()
    }
}

fn answer(item_type: LineItemType, accepted: bool) -> ItemAnswer {
    ItemAnswer {
        item_type,
        accepted,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn extended_zone_order_is_answered_and_activated(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let service = &portal.order_confirmations;

    let sent = service
        .send(
            SendOrderConfirmation {
                task_id,
                options: extended_with_glass(),
            },
            &staff(),
        )
        .await?;
    let token = sent.record.token().as_str().to_owned();
    ensure!(sent.public_url == format!("{BASE_URL}/confirm/{token}"));
    let offered: Vec<LineItemType> = sent.record.items().iter().map(|i| i.item_type).collect();
    ensure!(
        offered
            == [
                LineItemType::Standard,
                LineItemType::ExtendedZone,
                LineItemType::GlassRisk
            ]
    );

    let response = OrderConfirmationResponse::new(
        vec![
            answer(LineItemType::Standard, true),
            answer(LineItemType::ExtendedZone, false),
            answer(LineItemType::GlassRisk, true),
        ],
        None,
    )?;
    let answered = service.respond(&token, &response).await?;
    ensure!(answered.status() == OrderConfirmationStatus::ResponseReceived);
    let accepted: Vec<Acceptance> = answered.items().iter().map(|i| i.accepted).collect();
    ensure!(
        accepted
            == [
                Acceptance::Accepted,
                Acceptance::Rejected,
                Acceptance::Accepted
            ]
    );

    let activated = service.activate(task_id, &staff()).await?;
    ensure!(activated.status() == OrderConfirmationStatus::Activated);

    let task = portal.task(task_id).await?;
    ensure!(task.status() != TaskStatus::AwaitingConfirmation);
    ensure!(task.mirror().order_confirmation_status.as_deref() == Some("activated"));

    let actions: Vec<ActivityAction> = portal
        .activity
        .entries()?
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    ensure!(actions.contains(&ActivityAction::OrderConfirmationSent));
    ensure!(actions.contains(&ActivityAction::OrderConfirmationResponse));
    ensure!(actions.contains(&ActivityAction::OrderConfirmationActivated));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_answer_keeps_the_first(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let service = &portal.order_confirmations;
    let sent = service
        .send(
            SendOrderConfirmation {
                task_id,
                options: OrderOptions::default(),
            },
            &staff(),
        )
        .await?;
    let token = sent.record.token().as_str().to_owned();

    let first = OrderConfirmationResponse::new(vec![answer(LineItemType::Standard, true)], None)?;
    service.respond(&token, &first).await?;

    let second =
        OrderConfirmationResponse::new(vec![answer(LineItemType::Standard, false)], Some(false))?;
    let Err(err) = service.respond(&token, &second).await else {
        bail!("a second answer must be refused");
    };
    ensure!(matches!(err, WorkflowServiceError::AlreadyResponded));

    let stored = service.public_fetch(&token).await?;
    ensure!(stored.items().first().map(|i| i.accepted) == Some(Acceptance::Accepted));
    ensure!(stored.details().overall_accepted == Some(true));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lapsed_links_report_expiry(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let service = &portal.order_confirmations;
    let sent = service
        .send(
            SendOrderConfirmation {
                task_id,
                options: OrderOptions::default(),
            },
            &staff(),
        )
        .await?;
    let token = sent.record.token().as_str().to_owned();

    portal.clock.advance(TimeDelta::days(14));
    let still_open = service.public_fetch(&token).await?;
    ensure!(still_open.status() == OrderConfirmationStatus::Sent);

    portal.clock.advance(TimeDelta::seconds(1));
    let Err(err) = service.public_fetch(&token).await else {
        bail!("the link should have expired");
    };
    ensure!(matches!(err, WorkflowServiceError::Expired));

    let Some(stored) = service.find_for_task(task_id).await? else {
        bail!("the record should still exist");
    };
    ensure!(stored.status() == OrderConfirmationStatus::Expired);
    let task = portal.task(task_id).await?;
    ensure!(task.mirror().order_confirmation_status.as_deref() == Some("expired"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resend_reuses_the_link_without_a_state_change(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let service = &portal.order_confirmations;
    let sent = service
        .send(
            SendOrderConfirmation {
                task_id,
                options: OrderOptions::default(),
            },
            &staff(),
        )
        .await?;

    let resent = service
        .resend(
            ResendOrderConfirmation {
                task_id,
                override_email: Some("drift@example.com".to_owned()),
                override_phone: None,
                base_url: None,
            },
            &staff(),
        )
        .await?;
    ensure!(resent.public_url == sent.public_url);
    ensure!(resent.record.token() == sent.record.token());
    ensure!(resent.record.status() == OrderConfirmationStatus::Sent);
    ensure!(resent.record.updated_at() == sent.record.updated_at());
    let last_email = portal.email.sent().last().map(|message| message.to.clone());
    ensure!(last_email.as_deref() == Some("drift@example.com"));
    Ok(())
}
