//! Task read model and mirror-field writes.
//!
//! Tasks are owned by the broader portal. The confirmation workflows only
//! read identity and address fields from a task and write a small set of
//! status-mirror fields back through targeted updates. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
