//! # Taskbridge Domain
//!
//! Business domain types and models for Taskbridge.
//!
//! This crate contains:
//! - External snapshot types (issues, events) and the canonical model
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Embedded-metadata and title utilities
//!
//! ## Architecture
//! - No dependencies on other Taskbridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod buckets;
pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use buckets::SizeBucket;
pub use config::*;
pub use errors::*;
pub use types::*;
// Re-export metadata utilities
pub use utils::metadata::{EmbeddedLink, ShortCode};
