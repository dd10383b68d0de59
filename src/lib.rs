//! Confirmation engine: token-based workflows for external parties.
//!
//! The crate backs the customer-facing pages of a service company's
//! operations portal. Staff send an order confirmation, a property-owner
//! (bygherre) message or a photo report; the recipient opens a tokenised
//! link and answers without logging in. Answers advance a per-kind state
//! machine and are projected onto the owning task.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//!
//! # Modules
//!
//! - [`workflow`]: Token issuing, state machines and workflow services
//! - [`notification`]: SMS/email dispatch and the communication ledger
//! - [`task`]: Task read model and mirror-field projection target
//! - [`activity`]: Append-only business event log
//! - [`http`]: Public and staff HTTP routes
//! - [`config`]: Server configuration

pub mod activity;
pub mod config;
pub mod http;
pub mod notification;
pub mod task;
pub mod workflow;
