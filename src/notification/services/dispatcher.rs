//! Notification dispatcher.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::{error, info, warn};

use crate::notification::{
    domain::{
        Channel, ChannelOutcome, DeliveryReport, DeliveryStatus, LedgerEntry, LedgerEntryId,
        LedgerReference, OutboundMessage, normalize_phone,
    },
    ports::{CommunicationLedger, EmailProvider, ProviderError, ProviderReceipt, SmsProvider},
};

const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Which channels may be used and how long a provider call may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Whether the SMS provider is configured.
    pub sms_enabled: bool,
    /// Whether the email provider is configured.
    pub email_enabled: bool,
    /// Upper bound for one provider call.
    pub provider_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            sms_enabled: true,
            email_enabled: true,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

/// Messages to deliver in one round, one per channel.
///
/// A `None` channel is reported as skipped without contacting a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchPlan {
    /// Text message, if the recipient has a phone number.
    pub sms: Option<OutboundMessage>,
    /// Email, if the recipient has an address.
    pub email: Option<OutboundMessage>,
}

/// Sends messages and records every attempt in the ledger.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sms: Arc<dyn SmsProvider>,
    email: Arc<dyn EmailProvider>,
    ledger: Arc<dyn CommunicationLedger>,
    clock: Arc<dyn Clock + Send + Sync>,
    config: DispatcherConfig,
}

impl NotificationDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        sms: Arc<dyn SmsProvider>,
        email: Arc<dyn EmailProvider>,
        ledger: Arc<dyn CommunicationLedger>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            sms,
            email,
            ledger,
            clock,
            config,
        }
    }

    /// Returns the dispatcher configuration.
    #[must_use]
    pub const fn config(&self) -> DispatcherConfig {
        self.config
    }

    /// Delivers both channels of a plan concurrently.
    ///
    /// One channel failing never affects the other.
    pub async fn dispatch(
        &self,
        plan: DispatchPlan,
        reference: &LedgerReference,
    ) -> DeliveryReport {
        let DispatchPlan { sms, email } = plan;
        let (sms_outcome, email_outcome) = tokio::join!(
            self.send_or_skip(sms, "no number", reference),
            self.send_or_skip(email, "no email", reference),
        );
        DeliveryReport {
            sms: sms_outcome,
            email: email_outcome,
        }
    }

    async fn send_or_skip(
        &self,
        message: Option<OutboundMessage>,
        skip_reason: &str,
        reference: &LedgerReference,
    ) -> ChannelOutcome {
        match message {
            Some(outbound) => self.send(&outbound, reference).await,
            None => ChannelOutcome::skipped(skip_reason),
        }
    }

    /// Sends one message and appends the attempt to the ledger.
    ///
    /// Never fails: provider errors, timeouts and disabled channels are
    /// returned as [`ChannelOutcome::Failed`].
    pub async fn send(
        &self,
        message: &OutboundMessage,
        reference: &LedgerReference,
    ) -> ChannelOutcome {
        let channel = message.channel();
        let to = match message {
            OutboundMessage::Sms { to, .. } => normalize_phone(to),
            OutboundMessage::Email { to, .. } => to.clone(),
        };
        let created_at = self.clock.utc();
        let result = self.deliver(message, &to).await;

        let (outcome, entry) = match result {
            Ok(receipt) => {
                info!(
                    channel = channel.as_str(),
                    workflow_id = ?reference.workflow_id,
                    provider_id = ?receipt.provider_id,
                    "notification sent"
                );
                let entry = LedgerEntry {
                    id: LedgerEntryId::new(),
                    channel,
                    to: to.clone(),
                    status: DeliveryStatus::Sent,
                    error: None,
                    provider_id: receipt.provider_id.clone(),
                    summary: message.summary(),
                    reference: reference.clone(),
                    created_at,
                    sent_at: Some(self.clock.utc()),
                };
                let outcome = ChannelOutcome::Sent {
                    to,
                    provider_id: receipt.provider_id,
                };
                (outcome, entry)
            }
            Err(reason) => {
                warn!(
                    channel = channel.as_str(),
                    workflow_id = ?reference.workflow_id,
                    error = %reason,
                    "notification delivery failed"
                );
                let entry = LedgerEntry {
                    id: LedgerEntryId::new(),
                    channel,
                    to: to.clone(),
                    status: DeliveryStatus::Failed,
                    error: Some(reason.clone()),
                    provider_id: None,
                    summary: message.summary(),
                    reference: reference.clone(),
                    created_at,
                    sent_at: None,
                };
                (ChannelOutcome::Failed { to, error: reason }, entry)
            }
        };

        if let Err(err) = self.ledger.append(&entry).await {
            error!(
                channel = channel.as_str(),
                ledger_entry_id = %entry.id,
                error = %err,
                "failed to record delivery attempt"
            );
        }
        outcome
    }

    async fn deliver(
        &self,
        message: &OutboundMessage,
        to: &str,
    ) -> Result<ProviderReceipt, String> {
        let enabled = match message.channel() {
            Channel::Sms => self.config.sms_enabled,
            Channel::Email => self.config.email_enabled,
        };
        if !enabled {
            return Err(ProviderError::NotConfigured.to_string());
        }

        let call = async {
            match message {
                OutboundMessage::Sms { body, .. } => self.sms.send_sms(to, body).await,
                OutboundMessage::Email { subject, html, .. } => {
                    self.email.send_email(to, subject, html).await
                }
            }
        };
        match tokio::time::timeout(self.config.provider_timeout, call).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!(
                "provider call timed out after {}s",
                self.config.provider_timeout.as_secs()
            )),
        }
    }
}
