//! SendGrid email adapter.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;

use crate::notification::ports::{EmailProvider, ProviderError, ProviderReceipt, ProviderResult};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// SendGrid credentials and sender identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendGridConfig {
    /// API key.
    pub api_key: String,
    /// Verified sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
}

/// Sends email through the SendGrid v3 mail API.
#[derive(Debug, Clone)]
pub struct SendGridEmailProvider {
    config: SendGridConfig,
    client: reqwest::Client,
    send_url: String,
}

impl SendGridEmailProvider {
    /// Creates a provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: SendGridConfig, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            config,
            client: super::build_client(timeout)?,
            send_url: SENDGRID_SEND_URL.to_owned(),
        })
    }

    /// Points the provider at another send endpoint.
    #[must_use]
    pub fn with_send_url(mut self, send_url: impl Into<String>) -> Self {
        self.send_url = send_url.into();
        self
    }
}

#[async_trait]
impl EmailProvider for SendGridEmailProvider {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> ProviderResult<ProviderReceipt> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.config.from_email, "name": self.config.from_name },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }],
        });
        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::ACCEPTED && !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body: body_text,
            });
        }
        let provider_id = response
            .headers()
            .get("x-message-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(ProviderReceipt { provider_id })
    }
}
