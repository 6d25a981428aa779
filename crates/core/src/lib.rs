//! # Taskbridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The projector fusing external snapshots into canonical items
//! - The diff engine deriving operations from canonical state
//! - The interval scheduler placing new timed work
//! - The actuator executing operations with per-operation isolation
//! - Port/adapter interfaces (traits) for the two external APIs
//!
//! ## Architecture Principles
//! - Only depends on `taskbridge-domain`
//! - No network or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic; `now` is always injected

pub mod actuator;
pub mod diff;
pub mod ports;
pub mod projector;
pub mod scheduler;

// Re-export specific items to avoid ambiguity
pub use actuator::Actuator;
pub use diff::compute_operations;
pub use ports::{
    EventClient, EventDraft, EventPatch, IssueClient, IssueDraft, IssuePatch, IssueFilter,
};
pub use projector::{project, Projection, UidSource, UuidSource};
pub use scheduler::find_slot;
