//! Unit tests for the activity context.

mod log_tests;
