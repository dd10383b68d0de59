//! Opaque access tokens handed to external parties.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fmt::Write as _;

const FINGERPRINT_BYTES: usize = 8;

/// Unguessable token granting access to one workflow record.
///
/// `Debug` prints only the fingerprint so tokens never reach the logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short, non-reversible fingerprint suitable for logging.
    ///
    /// ```
    /// use confirmation_engine::workflow::domain::AccessToken;
    ///
    /// let token = AccessToken::new("secret");
    /// assert_eq!(token.fingerprint().len(), 16);
    /// assert!(!token.fingerprint().contains("secret"));
    /// ```
    #[must_use]
    pub fn fingerprint(&self) -> String {
        token_fingerprint(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&self.fingerprint()).finish()
    }
}

/// Fingerprints an untrusted token string from a request path.
#[must_use]
pub fn token_fingerprint(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    digest
        .iter()
        .take(FINGERPRINT_BYTES)
        .fold(String::with_capacity(FINGERPRINT_BYTES * 2), |mut hex, byte| {
            let _written = write!(hex, "{byte:02x}");
            hex
        })
}
