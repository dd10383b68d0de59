//! Provider adapters backed by HTTP APIs.

mod sendgrid;
mod twilio;

pub use sendgrid::{SendGridConfig, SendGridEmailProvider};
pub use twilio::{TwilioConfig, TwilioSmsProvider};

use async_trait::async_trait;

use crate::notification::ports::{
    EmailProvider, ProviderError, ProviderReceipt, ProviderResult, SmsProvider,
};

fn build_client(timeout: std::time::Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::Transport(err.to_string()))
}

/// Stands in for a channel whose credentials are missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

#[async_trait]
impl SmsProvider for UnconfiguredProvider {
    async fn send_sms(&self, _to: &str, _body: &str) -> ProviderResult<ProviderReceipt> {
        Err(ProviderError::NotConfigured)
    }
}

#[async_trait]
impl EmailProvider for UnconfiguredProvider {
    async fn send_email(
        &self,
        _to: &str,
        _subject: &str,
        _html: &str,
    ) -> ProviderResult<ProviderReceipt> {
        Err(ProviderError::NotConfigured)
    }
}
