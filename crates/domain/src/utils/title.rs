//! Status glyph handling for titles
//!
//! Both external systems display a leading status glyph on titles (inbox,
//! done, canceled, failed, carried-over). Canonical titles are stored with
//! the glyph stripped; the diff engine uses glyph presence as its
//! idempotence check when patching completed items.

use crate::constants::{
    GLYPH_CANCELED, GLYPH_CARRIED_OVER, GLYPH_DONE, GLYPH_FAILED, GLYPH_INBOX,
};
use crate::types::IssueState;

const STATUS_GLYPHS: [&str; 5] =
    [GLYPH_INBOX, GLYPH_DONE, GLYPH_CANCELED, GLYPH_FAILED, GLYPH_CARRIED_OVER];

/// Glyph for a terminal issue state, `None` for non-terminal states.
#[must_use]
pub const fn terminal_glyph(state: IssueState) -> Option<&'static str> {
    match state {
        IssueState::Done => Some(GLYPH_DONE),
        IssueState::Canceled => Some(GLYPH_CANCELED),
        IssueState::Failed => Some(GLYPH_FAILED),
        IssueState::Triage | IssueState::Scheduled => None,
    }
}

/// Strip a single leading status glyph (and following whitespace).
///
/// Only the known status glyphs are stripped; a title starting with any
/// other emoji is left untouched.
#[must_use]
pub fn strip_status_glyph(title: &str) -> String {
    let trimmed = title.trim_start();
    for glyph in STATUS_GLYPHS {
        if let Some(rest) = trimmed.strip_prefix(glyph) {
            return rest.trim_start().to_string();
        }
    }
    trimmed.to_string()
}

/// Prefix a title with a glyph, replacing any existing status glyph first.
#[must_use]
pub fn prefix_with_glyph(glyph: &str, title: &str) -> String {
    format!("{glyph} {}", strip_status_glyph(title))
}

/// Whether a title already carries the given glyph as its leading prefix.
#[must_use]
pub fn has_glyph_prefix(title: &str, glyph: &str) -> bool {
    title.trim_start().starts_with(glyph)
}
