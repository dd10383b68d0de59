//! Business-event activity log.
//!
//! Every workflow transition appends a human-readable entry here. The log
//! is distinct from the communication ledger: the ledger records delivery
//! attempts, the activity log records what happened to the business
//! entity and who did it.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
