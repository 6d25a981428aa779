//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Status glyphs prefixed onto titles. One leading glyph at most; the
// projector strips it before storing a canonical title.
pub const GLYPH_INBOX: &str = "📥";
pub const GLYPH_DONE: &str = "✅";
pub const GLYPH_CANCELED: &str = "🚫";
pub const GLYPH_FAILED: &str = "❌";
pub const GLYPH_CARRIED_OVER: &str = "🔁";

// Embedded metadata mini-format
pub const METADATA_TAG: &str = "[taskbridge]";

// Scheduling constants
pub const SLOT_BUFFER_MINUTES: i64 = 15;
pub const SCHEDULING_HORIZON_DAYS: i64 = 14;

// Phase classification
pub const OVERDUE_GRACE_HOURS: i64 = 24;

// Fallback duration when neither side yields an estimate
pub const DEFAULT_DURATION_MINUTES: u32 = 30;
