//! Channel isolation and the communication ledger.

use std::sync::Arc;

use confirmation_engine::notification::{
    domain::{Channel, ChannelOutcome, DeliveryStatus},
    ports::{CommunicationLedger, ProviderError},
    services::CommunicationHistory,
};
use confirmation_engine::workflow::{
    domain::{OrderConfirmationStatus, OrderOptions},
    services::SendOrderConfirmation,
};
use eyre::{bail, ensure};
use rstest::rstest;

use super::helpers::{Portal, portal, staff};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn email_outage_does_not_block_the_send(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    portal.email.fail_with(Some(ProviderError::Rejected {
        status: 503,
        body: "service unavailable".to_owned(),
    }));

    let sent = portal
        .order_confirmations
        .send(
            SendOrderConfirmation {
                task_id,
                options: OrderOptions::default(),
            },
            &staff(),
        )
        .await?;
    ensure!(sent.record.status() == OrderConfirmationStatus::Sent);
    ensure!(sent.delivery.sms_sent());
    let ChannelOutcome::Failed { to, error } = &sent.delivery.email else {
        bail!("email should report the failure, got {:?}", sent.delivery.email);
    };
    ensure!(to == "birgitte@example.com");
    ensure!(error.contains("503"));

    let entries = portal.ledger.entries()?;
    ensure!(entries.len() == 2);
    let sent_entries: Vec<_> = entries
        .iter()
        .filter(|entry| entry.status == DeliveryStatus::Sent)
        .collect();
    let failed_entries: Vec<_> = entries
        .iter()
        .filter(|entry| entry.status == DeliveryStatus::Failed)
        .collect();
    ensure!(sent_entries.len() == 1 && failed_entries.len() == 1);
    ensure!(sent_entries.iter().all(|entry| entry.channel == Channel::Sms));
    ensure!(
        sent_entries
            .iter()
            .all(|entry| entry.to == "+4521222324" && entry.provider_id.is_some())
    );
    ensure!(failed_entries.iter().all(|entry| entry.error.is_some()));
    ensure!(
        entries
            .iter()
            .all(|entry| entry.reference.task_id == Some(task_id))
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn history_summarises_contact_per_task(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let untouched = portal.seed_task()?;
    portal.sms.fail_with(Some(ProviderError::Transport(
        "connection reset".to_owned(),
    )));
    portal
        .order_confirmations
        .send(
            SendOrderConfirmation {
                task_id,
                options: OrderOptions::default(),
            },
            &staff(),
        )
        .await?;

    let ledger: Arc<dyn CommunicationLedger> = portal.ledger.clone();
    let history = CommunicationHistory::new(ledger);
    let summary = history.contact_summary(task_id).await?;
    ensure!(summary.email_sent);
    ensure!(!summary.sms_sent);
    ensure!(summary.last_contact_at.is_some());

    let quiet = history.contact_summary(untouched).await?;
    ensure!(!quiet.email_sent && !quiet.sms_sent);
    ensure!(history.list(Some(untouched), 10).await?.is_empty());
    ensure!(history.list(None, 10).await?.len() == 2);
    Ok(())
}
