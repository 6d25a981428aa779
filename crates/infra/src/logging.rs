//! Tracing subscriber setup
//!
//! One global subscriber, configured once at startup. The filter comes from
//! `TASKBRIDGE_LOG` (standard `tracing_subscriber` directive syntax) and
//! falls back to `info` when unset or unparsable.

use taskbridge_domain::{Result, TaskbridgeError};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_FILTER_ENV: &str = "TASKBRIDGE_LOG";

/// Install the global tracing subscriber.
///
/// # Errors
/// Returns `TaskbridgeError::Internal` if a global subscriber is already
/// installed.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| TaskbridgeError::Internal(format!("failed to set tracing subscriber: {e}")))
}
