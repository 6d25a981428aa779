//! Client adapters implementing the core ports.

pub mod memory;

pub use memory::{InMemoryEventClient, InMemoryIssueClient};
