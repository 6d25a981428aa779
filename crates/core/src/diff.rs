//! Diff engine
//!
//! Turns canonical state into the minimal operation list. Pure and
//! per-item: each item's operations depend only on that item, so the output
//! order is the input order and items never interact.
//!
//! Idempotence is the design rule here, not retries: running the diff again
//! after a successful actuation must produce nothing new for unchanged
//! external state.

use taskbridge_domain::utils::title::{has_glyph_prefix, terminal_glyph};
use taskbridge_domain::{CanonicalItem, IssueState, Operation, OperationKind, Phase};
use tracing::debug;

/// Compute the operations needed to reconcile the given canonical items.
#[must_use]
pub fn compute_operations(items: &[CanonicalItem]) -> Vec<Operation> {
    let operations: Vec<Operation> =
        items.iter().filter_map(operations_for_item).collect();

    debug!(items = items.len(), operations = operations.len(), "diff complete");
    operations
}

fn operations_for_item(item: &CanonicalItem) -> Option<Operation> {
    match item.phase {
        // No issue exists yet, so no idempotence check is needed: the item
        // is event-only precisely because the issue side is missing.
        Phase::EventOnly => Some(Operation {
            kind: OperationKind::CreateIssueAndLinkEvent,
            item: item.clone(),
            reason: "calendar event has no tracked issue".to_string(),
        }),

        // Scheduling a calendar slot is an explicit user action: only a
        // Scheduled issue earns an event. Triage and everything else waits.
        Phase::IssueOnly => match item.issue_state {
            Some(IssueState::Scheduled) => Some(Operation {
                kind: OperationKind::CreateEventAndLinkIssue,
                item: item.clone(),
                reason: "scheduled issue has no calendar event".to_string(),
            }),
            _ => None,
        },

        // Defensive: a partially-failed prior pass can leave one side
        // absent. A side counts as missing only when its id is absent; a
        // created-but-not-yet-linked side is pending, not missing.
        Phase::Active => {
            if item.issue_id.is_none() {
                Some(Operation {
                    kind: OperationKind::CreateIssueAndLinkEvent,
                    item: item.clone(),
                    reason: "active item lost its issue side".to_string(),
                })
            } else if item.event_id.is_none() {
                Some(Operation {
                    kind: OperationKind::CreateEventAndLinkIssue,
                    item: item.clone(),
                    reason: "active item lost its event side".to_string(),
                })
            } else {
                None
            }
        }

        // Mandatory idempotence check: patch only when the event's current
        // title does not already carry the glyph of the terminal state.
        Phase::Completed => {
            let glyph = item.issue_state.and_then(terminal_glyph)?;
            let event_title = item.event_title.as_deref().unwrap_or("");
            if has_glyph_prefix(event_title, glyph) {
                None
            } else {
                Some(Operation {
                    kind: OperationKind::PatchEvent,
                    item: item.clone(),
                    reason: format!("mark event title with {glyph}"),
                })
            }
        }

        // One composite operation; the actuator expands it into the archive
        // copy (skipped without a history calendar) plus the reschedule.
        Phase::Overdue => Some(Operation {
            kind: OperationKind::CopyToHistoryAndReschedule,
            item: item.clone(),
            reason: "event ended more than a day ago without completion".to_string(),
        }),
    }
}
