//! Unit tests for the notification context.

mod domain_tests;
