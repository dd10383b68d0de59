//! Domain types for notification delivery.

mod channel;
mod error;
mod ledger;
mod message;
mod outcome;
mod phone;

pub use channel::Channel;
pub use error::NotificationDomainError;
pub use ledger::{ContactSummary, DeliveryStatus, LedgerEntry, LedgerEntryId, LedgerReference};
pub use message::OutboundMessage;
pub use outcome::{ChannelOutcome, DeliveryReport};
pub use phone::normalize_phone;
