//! Shared test support for the core integration tests.

pub mod clients;

pub use clients::{InMemoryEventClient, InMemoryIssueClient};
