//! Step definitions for order confirmation scenarios.

pub mod world;

mod given;
mod then;
mod when;
