//! Adapter implementations for the activity log port.

pub mod memory;
pub mod postgres;
