//! Delivery channels.

use serde::{Deserialize, Serialize};

/// Channel a message is delivered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Text message through the SMS provider.
    Sms,
    /// HTML email through the email provider.
    Email,
}

impl Channel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }
}

impl TryFrom<&str> for Channel {
    type Error = super::NotificationDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            other => Err(super::NotificationDomainError::UnknownChannel(
                other.to_owned(),
            )),
        }
    }
}
