//! Access token issuance.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::debug;

use crate::task::domain::TaskId;
use crate::workflow::domain::{AccessToken, WorkflowKind};

const TOKEN_BYTES: usize = 32;
const DEFAULT_ORDER_CONFIRMATION_TTL_DAYS: i64 = 14;

/// Source of raw token values.
pub trait TokenSource: Send + Sync {
    /// Produces a fresh token.
    fn generate(&self) -> AccessToken;
}

/// Draws 256 bits from the operating system RNG and encodes them as
/// URL-safe base64 without padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngTokenSource;

impl TokenSource for OsRngTokenSource {
    fn generate(&self) -> AccessToken {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        AccessToken::new(URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// How long links stay valid, per workflow kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Lifetime of order confirmation links.
    pub order_confirmation_ttl: TimeDelta,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            order_confirmation_ttl: TimeDelta::days(DEFAULT_ORDER_CONFIRMATION_TTL_DAYS),
        }
    }
}

impl ExpiryPolicy {
    /// Creates a policy with the given order confirmation lifetime in days.
    #[must_use]
    pub fn with_order_confirmation_days(days: u32) -> Self {
        Self {
            order_confirmation_ttl: TimeDelta::days(i64::from(days)),
        }
    }

    /// Returns the expiry for a link issued at `now`, if the kind expires.
    #[must_use]
    pub fn expires_at(&self, kind: WorkflowKind, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match kind {
            WorkflowKind::OrderConfirmation => now.checked_add_signed(self.order_confirmation_ttl),
            WorkflowKind::Bygherre | WorkflowKind::PhotoReport => None,
        }
    }
}

/// A freshly issued token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Token value.
    pub token: AccessToken,
    /// Expiry, for kinds that expire.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issues access tokens bound to new workflow records.
///
/// Tokens are resolved through the workflow repositories, which only match
/// a record's live token; rotating a record's token retires the old one.
#[derive(Clone)]
pub struct TokenIssuer {
    source: Arc<dyn TokenSource>,
    clock: Arc<dyn Clock + Send + Sync>,
    policy: ExpiryPolicy,
}

impl TokenIssuer {
    /// Creates an issuer.
    #[must_use]
    pub fn new(
        source: Arc<dyn TokenSource>,
        clock: Arc<dyn Clock + Send + Sync>,
        policy: ExpiryPolicy,
    ) -> Self {
        Self {
            source,
            clock,
            policy,
        }
    }

    /// Issues a token for a new record of `kind`.
    #[must_use]
    pub fn issue(&self, kind: WorkflowKind, task_id: Option<TaskId>) -> IssuedToken {
        let token = self.source.generate();
        let expires_at = self.policy.expires_at(kind, self.clock.utc());
        debug!(
            workflow_kind = kind.as_str(),
            task_id = ?task_id,
            token_fingerprint = %token.fingerprint(),
            "issued access token"
        );
        IssuedToken { token, expires_at }
    }

    /// Issues a replacement token for an existing record.
    #[must_use]
    pub fn reissue(&self, kind: WorkflowKind) -> AccessToken {
        let token = self.source.generate();
        debug!(
            workflow_kind = kind.as_str(),
            token_fingerprint = %token.fingerprint(),
            "reissued access token"
        );
        token
    }
}
