//! Common data types used throughout the application
//!
//! External snapshot types mirror what the two provider APIs return; the
//! canonical model is the fused view produced once per reconciliation pass.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::buckets::SizeBucket;

/// Private-property key carrying the canonical uid on an event.
pub const EVENT_PROP_UID: &str = "uid";
/// Private-property key carrying the linked issue id on an event.
pub const EVENT_PROP_LINKED_ISSUE: &str = "linkedIssueId";

/// Lifecycle status of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventStatus {
    Confirmed,
    Cancelled,
}

/// Timed item owned by the calendar system.
///
/// Read-only to the projector; created, updated, and deleted only by the
/// calendar system itself or by the actuator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub status: EventStatus,
    /// Extensible private key-value bag attached by this system
    /// (`uid`, `linkedIssueId`). Opaque to the calendar UI.
    #[serde(default)]
    pub private_properties: BTreeMap<String, String>,
}

impl ExternalEvent {
    /// Canonical uid stored in the private bag, if any.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.private_properties.get(EVENT_PROP_UID).map(String::as_str)
    }

    /// Linked issue id stored in the private bag, if any.
    #[must_use]
    pub fn linked_issue_id(&self) -> Option<&str> {
        self.private_properties.get(EVENT_PROP_LINKED_ISSUE).map(String::as_str)
    }

    /// Event duration in whole minutes (zero when end precedes start).
    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        let minutes = (self.end - self.start).num_minutes();
        u32::try_from(minutes.max(0)).unwrap_or(u32::MAX)
    }
}

/// Finite state of a tracked issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueState {
    Triage,
    Scheduled,
    Done,
    Canceled,
    Failed,
}

impl IssueState {
    /// Whether this state terminates the item's lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Canceled | Self::Failed)
    }
}

/// Trackable work item owned by the issue-tracking system.
///
/// The description is the only channel for attached metadata; the issue
/// system has no custom-field support.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIssue {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub state: IssueState,
    pub target_date: Option<NaiveDate>,
    pub estimate_points: Option<u8>,
}

/// Derived lifecycle stage of a canonical item, recomputed every pass and
/// never stored externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    EventOnly,
    IssueOnly,
    Active,
    Completed,
    Overdue,
}

/// Fused, authoritative record for one unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalItem {
    /// Stable cross-system join key, minted at first observation and
    /// round-tripped via the calendar system's private bag.
    pub uid: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub size: SizeBucket,
    pub issue_id: Option<String>,
    pub event_id: Option<String>,
    /// Raw event title as currently displayed in the calendar, glyph
    /// included. The diff engine's completed-patch idempotence check reads
    /// this, not the fused (stripped) title.
    pub event_title: Option<String>,
    pub issue_state: Option<IssueState>,
    pub phase: Phase,
    /// Wall clock of the pass that produced this item. Logging only; never
    /// used for conflict resolution.
    pub last_observed_at: DateTime<Utc>,
}

/// Closed set of instruction kinds produced by the diff step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    CreateIssue,
    CreateEvent,
    PatchEvent,
    PatchIssue,
    CopyToHistoryAndReschedule,
    CreateIssueAndLinkEvent,
    CreateEventAndLinkIssue,
}

/// A single typed instruction, produced fresh each pass and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub kind: OperationKind,
    pub item: CanonicalItem,
    pub reason: String,
}

/// Outcome of executing one operation.
///
/// `value` carries the primary created/updated entity id on success; `error`
/// carries the captured failure message otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub operation: Operation,
    pub success: bool,
    pub value: Option<String>,
    pub error: Option<String>,
}

/// Free time interval returned by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Aggregate outcome of one reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    pub items: usize,
    pub operations: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub orphaned_issues: Vec<String>,
    pub orphaned_events: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
