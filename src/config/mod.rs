//! Server configuration.
//!
//! [`AppConfig`] is read from an optional TOML file named by
//! `PORTAL_CONFIG` and then overridden field by field from environment
//! variables. Environment lookup goes through a caller-supplied function
//! so loading can be exercised without touching process state.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::notification::adapters::http::{SendGridConfig, TwilioConfig};
use crate::notification::services::DispatcherConfig;
use crate::workflow::services::ExpiryPolicy;

const CONFIG_PATH_VAR: &str = "PORTAL_CONFIG";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_BRAND_NAME: &str = "SMARTREP";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ORDER_CONFIRMATION_TTL_DAYS: u32 = 14;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override has an unusable value.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Twilio credentials. SMS is enabled only when all three are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TwilioSettings {
    /// Account SID.
    pub account_sid: Option<String>,
    /// Auth token.
    pub auth_token: Option<String>,
    /// Alphanumeric sender id.
    pub sender_id: Option<String>,
}

/// SendGrid credentials. Email is enabled when key and sender are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SendGridSettings {
    /// API key.
    pub api_key: Option<String>,
    /// Verified sender address.
    pub from_email: Option<String>,
    /// Sender display name; the brand name when absent.
    pub from_name: Option<String>,
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// `PostgreSQL` connection string; in-memory adapters are used when absent.
    pub database_url: Option<String>,
    /// Base URL public links are built from.
    pub public_base_url: String,
    /// Brand shown in message texts.
    pub brand_name: String,
    /// SMS provider credentials.
    pub twilio: TwilioSettings,
    /// Email provider credentials.
    pub sendgrid: SendGridSettings,
    /// Upper bound for one provider call, in seconds.
    pub provider_timeout_secs: u64,
    /// Lifetime of order confirmation links, in days.
    pub order_confirmation_ttl_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            database_url: None,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
            brand_name: DEFAULT_BRAND_NAME.to_owned(),
            twilio: TwilioSettings::default(),
            sendgrid: SendGridSettings::default(),
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            order_confirmation_ttl_days: DEFAULT_ORDER_CONFIRMATION_TTL_DAYS,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// an override is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(&|key| std::env::var(key).ok())
    }

    /// Loads configuration using `lookup` for environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// an override is malformed.
    pub fn load_with(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses TOML configuration. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let text = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = text("PORTAL_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = text("DATABASE_URL") {
            self.database_url = Some(value);
        }
        if let Some(value) = text("PORTAL_PUBLIC_URL") {
            self.public_base_url = value;
        }
        if let Some(value) = text("PORTAL_BRAND_NAME") {
            self.brand_name = value;
        }
        override_opt(&mut self.twilio.account_sid, text("TWILIO_ACCOUNT_SID"));
        override_opt(&mut self.twilio.auth_token, text("TWILIO_AUTH_TOKEN"));
        override_opt(&mut self.twilio.sender_id, text("TWILIO_SENDER_ID"));
        override_opt(&mut self.sendgrid.api_key, text("SENDGRID_API_KEY"));
        override_opt(&mut self.sendgrid.from_email, text("SENDGRID_FROM_EMAIL"));
        override_opt(&mut self.sendgrid.from_name, text("SENDGRID_FROM_NAME"));
        if let Some(value) = text("DISPATCH_TIMEOUT_SECS") {
            self.provider_timeout_secs = parse_number("DISPATCH_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = text("ORDER_CONFIRMATION_TTL_DAYS") {
            self.order_confirmation_ttl_days = parse_number("ORDER_CONFIRMATION_TTL_DAYS", value)?;
        }
        Ok(())
    }

    /// Returns Twilio credentials when all of them are present.
    #[must_use]
    pub fn twilio_config(&self) -> Option<TwilioConfig> {
        let settings = &self.twilio;
        Some(TwilioConfig {
            account_sid: settings.account_sid.clone()?,
            auth_token: settings.auth_token.clone()?,
            sender_id: settings.sender_id.clone()?,
        })
    }

    /// Returns SendGrid credentials when key and sender address are present.
    #[must_use]
    pub fn sendgrid_config(&self) -> Option<SendGridConfig> {
        let settings = &self.sendgrid;
        Some(SendGridConfig {
            api_key: settings.api_key.clone()?,
            from_email: settings.from_email.clone()?,
            from_name: settings
                .from_name
                .clone()
                .unwrap_or_else(|| self.brand_name.clone()),
        })
    }

    /// Returns the provider call timeout.
    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Derives the dispatcher settings. A channel is enabled exactly when
    /// its provider credentials are complete.
    #[must_use]
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            sms_enabled: self.twilio_config().is_some(),
            email_enabled: self.sendgrid_config().is_some(),
            provider_timeout: self.provider_timeout(),
        }
    }

    /// Returns the link expiry policy.
    #[must_use]
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::with_order_confirmation_days(self.order_confirmation_ttl_days)
    }
}

fn override_opt(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
