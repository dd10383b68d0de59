//! Providers that record messages instead of delivering them.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::notification::ports::{
    EmailProvider, ProviderError, ProviderReceipt, ProviderResult, SmsProvider,
};

/// A message captured by a recording provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMessage {
    /// Recipient address.
    pub to: String,
    /// Email subject, empty for text messages.
    pub subject: String,
    /// Message body.
    pub body: String,
}

#[derive(Debug, Default)]
struct RecorderState {
    sent: Vec<RecordedMessage>,
    failure: Option<ProviderError>,
}

#[derive(Debug, Clone, Default)]
struct Recorder {
    state: Arc<RwLock<RecorderState>>,
}

impl Recorder {
    fn record(&self, message: RecordedMessage, prefix: &str) -> ProviderResult<ProviderReceipt> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        if let Some(failure) = state.failure.clone() {
            return Err(failure);
        }
        state.sent.push(message);
        Ok(ProviderReceipt::with_id(format!("{prefix}-{}", state.sent.len())))
    }

    fn fail_with(&self, failure: Option<ProviderError>) {
        if let Ok(mut state) = self.state.write() {
            state.failure = failure;
        }
    }

    fn sent(&self) -> Vec<RecordedMessage> {
        self.state
            .read()
            .map(|state| state.sent.clone())
            .unwrap_or_default()
    }
}

/// SMS provider that records accepted messages.
#[derive(Debug, Clone, Default)]
pub struct RecordingSmsProvider {
    recorder: Recorder,
}

impl RecordingSmsProvider {
    /// Creates a provider that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call fail with `failure`, or succeed again on `None`.
    pub fn fail_with(&self, failure: Option<ProviderError>) {
        self.recorder.fail_with(failure);
    }

    /// Returns accepted messages in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<RecordedMessage> {
        self.recorder.sent()
    }
}

#[async_trait]
impl SmsProvider for RecordingSmsProvider {
    async fn send_sms(&self, to: &str, body: &str) -> ProviderResult<ProviderReceipt> {
        let message = RecordedMessage {
            to: to.to_owned(),
            subject: String::new(),
            body: body.to_owned(),
        };
        self.recorder.record(message, "sms")
    }
}

/// Email provider that records accepted messages.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmailProvider {
    recorder: Recorder,
}

impl RecordingEmailProvider {
    /// Creates a provider that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call fail with `failure`, or succeed again on `None`.
    pub fn fail_with(&self, failure: Option<ProviderError>) {
        self.recorder.fail_with(failure);
    }

    /// Returns accepted messages in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<RecordedMessage> {
        self.recorder.sent()
    }
}

#[async_trait]
impl EmailProvider for RecordingEmailProvider {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> ProviderResult<ProviderReceipt> {
        let message = RecordedMessage {
            to: to.to_owned(),
            subject: subject.to_owned(),
            body: html.to_owned(),
        };
        self.recorder.record(message, "email")
    }
}
