//! Embedded cross-reference metadata
//!
//! The issue tracker has no custom-field support, so the only place this
//! system can attach structured data to an issue is its free-text
//! description. We embed a single tagged line at the head of the
//! description:
//!
//! ```text
//! [taskbridge] eventId:evt_123 start:2025-03-10T10:00:00Z durationMinutes:30
//! ```
//!
//! The format is deliberately tiny: a tag followed by `key:value` pairs
//! separated by single spaces. Values never contain spaces (event ids are
//! opaque API ids, timestamps are RFC 3339). Parsing its own output must
//! reproduce the original values exactly; `serialize`/`parse` below are that
//! round-trip pair.
//!
//! Short-codes (`ABC-123` style issue identifiers appearing in free text)
//! are a secondary linking signal only; they carry no uid and never override
//! either authoritative link.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::METADATA_TAG;
use crate::errors::{Result, TaskbridgeError};

static SHORT_CODE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)] // pattern is a compile-time constant
    Regex::new(r"\b([A-Z][A-Z0-9]+-\d+)\b").expect("short-code pattern is valid")
});

/// Issue-tracker short-code found in free text (e.g. `OPS-142`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortCode(pub String);

/// Structured link embedded at the head of an issue description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedLink {
    pub event_id: String,
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl EmbeddedLink {
    /// Render the single-line form of this link.
    #[must_use]
    pub fn serialize(&self) -> String {
        format!(
            "{METADATA_TAG} eventId:{} start:{} durationMinutes:{}",
            self.event_id,
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.duration_minutes
        )
    }

    /// Parse a tagged line back into a link.
    ///
    /// # Errors
    /// Returns `TaskbridgeError::Metadata` when the tag is missing, a key is
    /// absent or duplicated-away, or a value fails to parse.
    pub fn parse(line: &str) -> Result<Self> {
        let rest = line
            .trim()
            .strip_prefix(METADATA_TAG)
            .ok_or_else(|| TaskbridgeError::Metadata(format!("missing {METADATA_TAG} tag")))?;

        let mut event_id = None;
        let mut start = None;
        let mut duration_minutes = None;

        for pair in rest.split_whitespace() {
            let (key, value) = pair.split_once(':').ok_or_else(|| {
                TaskbridgeError::Metadata(format!("malformed key-value pair: {pair}"))
            })?;

            match key {
                "eventId" => event_id = Some(value.to_string()),
                // split_once keeps the value's own colons intact
                "start" => start = Some(value.to_string()),
                "durationMinutes" => duration_minutes = Some(value.to_string()),
                _ => {
                    // Unknown keys are ignored so older builds can read
                    // lines written by newer ones.
                }
            }
        }

        let event_id = event_id
            .ok_or_else(|| TaskbridgeError::Metadata("missing eventId".to_string()))?;
        let start_raw =
            start.ok_or_else(|| TaskbridgeError::Metadata("missing start".to_string()))?;
        let duration_raw = duration_minutes
            .ok_or_else(|| TaskbridgeError::Metadata("missing durationMinutes".to_string()))?;

        let start = DateTime::parse_from_rfc3339(&start_raw)
            .map_err(|e| TaskbridgeError::Metadata(format!("invalid start timestamp: {e}")))?
            .with_timezone(&Utc);
        let duration_minutes = duration_raw
            .parse::<u32>()
            .map_err(|e| TaskbridgeError::Metadata(format!("invalid durationMinutes: {e}")))?;

        Ok(Self { event_id, start, duration_minutes })
    }

    /// Extract the embedded link from an issue description, if present.
    ///
    /// Only the first line is considered; the tag is required to lead it.
    /// A malformed tagged line is treated as absent rather than an error —
    /// stale or hand-edited metadata must never poison a pass.
    #[must_use]
    pub fn from_description(description: Option<&str>) -> Option<Self> {
        let first_line = description?.lines().next()?;
        if !first_line.trim_start().starts_with(METADATA_TAG) {
            return None;
        }
        Self::parse(first_line).ok()
    }
}

/// Remove a previously embedded metadata line from a description.
///
/// Applied before every description write so repeated reschedules never
/// accumulate stale cross-references. Text without a leading tagged line is
/// returned unchanged.
#[must_use]
pub fn strip_embedded(description: &str) -> String {
    let mut lines = description.lines();
    match lines.next() {
        Some(first) if first.trim_start().starts_with(METADATA_TAG) => {
            let rest: Vec<&str> = lines.collect();
            // Drop the blank separator the serializer inserts after the tag
            let rest = match rest.split_first() {
                Some((blank, tail)) if blank.trim().is_empty() => tail.to_vec(),
                _ => rest,
            };
            rest.join("\n")
        }
        _ => description.to_string(),
    }
}

/// Prepend an embedded link to a description, replacing any previous one.
#[must_use]
pub fn with_embedded(link: &EmbeddedLink, description: Option<&str>) -> String {
    let body = description.map(strip_embedded).unwrap_or_default();
    if body.is_empty() {
        link.serialize()
    } else {
        format!("{}\n\n{body}", link.serialize())
    }
}

/// Find the first issue short-code embedded in free text.
#[must_use]
pub fn extract_short_code(text: &str) -> Option<ShortCode> {
    SHORT_CODE.captures(text).map(|caps| ShortCode(caps[1].to_string()))
}
