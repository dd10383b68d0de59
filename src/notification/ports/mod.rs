//! Port contracts for outbound providers and the communication ledger.

pub mod ledger;
pub mod provider;

pub use ledger::{CommunicationLedger, LedgerError, LedgerResult};
pub use provider::{EmailProvider, ProviderError, ProviderReceipt, ProviderResult, SmsProvider};

#[cfg(test)]
pub use provider::{MockEmailProvider, MockSmsProvider};
