//! Three-valued answer carried by every response unit.

use serde::{Deserialize, Serialize};

/// Answer to one response unit: not yet answered, accepted or rejected.
///
/// Serialised as `null`, `true` or `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Acceptance {
    /// No answer yet.
    #[default]
    Unset,
    /// The unit was accepted.
    Accepted,
    /// The unit was rejected.
    Rejected,
}

impl Acceptance {
    /// Returns whether an answer has been given.
    #[must_use]
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl From<Option<bool>> for Acceptance {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unset,
            Some(true) => Self::Accepted,
            Some(false) => Self::Rejected,
        }
    }
}

impl From<bool> for Acceptance {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

impl From<Acceptance> for Option<bool> {
    fn from(value: Acceptance) -> Self {
        match value {
            Acceptance::Unset => None,
            Acceptance::Accepted => Some(true),
            Acceptance::Rejected => Some(false),
        }
    }
}
