//! Domain-level utility modules

pub mod metadata;
pub mod title;
