//! # Taskbridge Infrastructure
//!
//! Everything impure lives here:
//! - configuration loading (environment variables and config files)
//! - tracing subscriber setup
//! - client adapters implementing the core ports
//! - the reconcile worker that drives whole passes on demand
//!
//! ## Architecture
//! - Implements traits defined in `taskbridge-core`
//! - Depends on `taskbridge-domain` and `taskbridge-core`
//! - The engine crates never read ambient state; this crate feeds them

pub mod clients;
pub mod config;
pub mod logging;
pub mod sync;

// Re-export commonly used items
pub use clients::{InMemoryEventClient, InMemoryIssueClient};
pub use sync::ReconcileWorker;
