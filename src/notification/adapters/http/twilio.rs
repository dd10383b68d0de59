//! Twilio SMS adapter.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::notification::ports::{ProviderError, ProviderReceipt, ProviderResult, SmsProvider};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Twilio credentials and sender identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    /// Account SID.
    pub account_sid: String,
    /// Auth token.
    pub auth_token: String,
    /// Alphanumeric sender id or phone number.
    pub sender_id: String,
}

/// Sends text messages through the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioSmsProvider {
    config: TwilioConfig,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

impl TwilioSmsProvider {
    /// Creates a provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: TwilioConfig, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            config,
            client: super::build_client(timeout)?,
            base_url: TWILIO_API_BASE.to_owned(),
        })
    }

    /// Points the provider at another API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SmsProvider for TwilioSmsProvider {
    async fn send_sms(&self, to: &str, body: &str) -> ProviderResult<ProviderReceipt> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.base_url, self.config.account_sid
        );
        let form = [
            ("To", to),
            ("From", self.config.sender_id.as_str()),
            ("Body", body),
        ];
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body: body_text,
            });
        }
        let resource = response
            .json::<MessageResource>()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        Ok(ProviderReceipt {
            provider_id: resource.sid,
        })
    }
}
