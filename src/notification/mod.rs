//! Outbound notification delivery and the communication ledger.
//!
//! The dispatcher sends one message over one channel and normalises the
//! provider result into a [`domain::ChannelOutcome`]. It never returns an
//! error: provider failures, timeouts and disabled channels all become
//! `failed` ledger entries so the surrounding workflow transition is never
//! aborted by a delivery problem.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
