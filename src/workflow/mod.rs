//! Token-guarded confirmation workflows for external parties.
//!
//! Customers and property owners hold no portal account. Each workflow
//! issues an opaque token, delivers a link over SMS and email, and accepts
//! exactly one response through the token. State changes are persisted
//! with conditional writes so a replayed response cannot succeed twice,
//! and each transition is mirrored onto the owning task.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Application services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
