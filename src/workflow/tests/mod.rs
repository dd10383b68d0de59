//! Unit tests for the workflow context.

mod store_tests;
mod support;
