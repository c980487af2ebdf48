//! Shared fixtures for the TETHER integration tests.

#[path = "fixtures/two_node.rs"]
pub mod two_node;
