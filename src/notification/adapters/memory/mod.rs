//! In-memory ledger and recording providers for tests and local runs.

mod ledger;
mod providers;

pub use ledger::InMemoryLedger;
pub use providers::{RecordedMessage, RecordingEmailProvider, RecordingSmsProvider};
