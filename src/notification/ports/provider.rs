//! Outbound SMS and email provider ports.

use async_trait::async_trait;
use thiserror::Error;

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderReceipt {
    /// Provider message identifier, when the provider returns one.
    pub provider_id: Option<String>,
}

impl ProviderReceipt {
    /// Creates a receipt carrying a provider identifier.
    #[must_use]
    pub fn with_id(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
        }
    }
}

/// Errors returned by outbound providers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider credentials are missing.
    #[error("provider not configured")]
    NotConfigured,

    /// The provider answered with a non-success status.
    #[error("provider rejected message with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The request could not be completed.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Text message provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Sends a text message to a normalised E.164 number.
    async fn send_sms(&self, to: &str, body: &str) -> ProviderResult<ProviderReceipt>;
}

/// HTML email provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Sends an HTML email.
    async fn send_email(&self, to: &str, subject: &str, html: &str)
    -> ProviderResult<ProviderReceipt>;
}
