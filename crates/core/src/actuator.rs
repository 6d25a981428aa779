//! Operation actuator
//!
//! Executes the diff engine's operations against the two injected clients.
//! Execution is strictly sequential and independent per operation: a failure
//! is captured into that operation's result and the loop moves on. There is
//! no batching, no parallel dispatch, and no retry — idempotent operations
//! make re-running the whole pass the recovery path after partial failure.
//!
//! Composite operations perform the primary creation first and then
//! best-effort patch the other side with the new cross-reference. A failed
//! secondary patch is logged and swallowed; the link self-heals on a later
//! pass through the defensive active-phase rule in the diff engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskbridge_domain::constants::{GLYPH_CARRIED_OVER, GLYPH_INBOX};
use taskbridge_domain::utils::metadata::{with_embedded, EmbeddedLink};
use taskbridge_domain::utils::title::{prefix_with_glyph, terminal_glyph};
use taskbridge_domain::{
    CanonicalItem, Config, ExternalEvent, IssueState, Operation, OperationKind, OperationResult,
    Result, Slot, TaskbridgeError, EVENT_PROP_LINKED_ISSUE, EVENT_PROP_UID,
};
use tracing::{debug, error, info, warn};

use crate::ports::{EventClient, EventDraft, EventPatch, IssueClient, IssueDraft, IssuePatch};
use crate::scheduler::find_slot;

/// Executes operations against the two external systems.
pub struct Actuator {
    issues: Arc<dyn IssueClient>,
    events: Arc<dyn EventClient>,
    config: Config,
}

impl Actuator {
    /// Create a new actuator over the injected clients.
    pub fn new(issues: Arc<dyn IssueClient>, events: Arc<dyn EventClient>, config: Config) -> Self {
        Self { issues, events, config }
    }

    /// Execute operations in list order with per-operation failure isolation.
    ///
    /// `existing_events` is the event list fetched at the start of the pass;
    /// the scheduler reads it as-is and it is never re-fetched mid-pass.
    pub async fn execute(
        &self,
        operations: &[Operation],
        existing_events: &[ExternalEvent],
        now: DateTime<Utc>,
    ) -> Vec<OperationResult> {
        let mut results = Vec::with_capacity(operations.len());

        for operation in operations {
            let outcome = self.apply(operation, existing_events, now).await;
            match outcome {
                Ok(value) => {
                    info!(kind = ?operation.kind, uid = %operation.item.uid, "operation applied");
                    results.push(OperationResult {
                        operation: operation.clone(),
                        success: true,
                        value: Some(value),
                        error: None,
                    });
                }
                Err(err) => {
                    error!(
                        kind = ?operation.kind,
                        uid = %operation.item.uid,
                        error = %err,
                        "operation failed"
                    );
                    results.push(OperationResult {
                        operation: operation.clone(),
                        success: false,
                        value: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        results
    }

    async fn apply(
        &self,
        operation: &Operation,
        existing_events: &[ExternalEvent],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let item = &operation.item;
        match operation.kind {
            OperationKind::CreateIssue => self.create_issue(item).await,
            OperationKind::CreateEvent => self.create_event(item, existing_events, now).await,
            OperationKind::PatchEvent => self.patch_event_title(item).await,
            OperationKind::PatchIssue => self.patch_issue_metadata(item).await,
            OperationKind::CreateIssueAndLinkEvent => {
                self.create_issue_and_link_event(item).await
            }
            OperationKind::CreateEventAndLinkIssue => {
                self.create_event_and_link_issue(item, existing_events, now).await
            }
            OperationKind::CopyToHistoryAndReschedule => {
                self.copy_to_history_and_reschedule(item, existing_events, now).await
            }
        }
    }

    /// Create the issue side for an item, state Triage, title inbox-marked.
    async fn create_issue(&self, item: &CanonicalItem) -> Result<String> {
        let description = match (&item.event_id, item.start_time) {
            (Some(event_id), Some(start)) => {
                let link = EmbeddedLink {
                    event_id: event_id.clone(),
                    start,
                    duration_minutes: item.duration_minutes,
                };
                Some(with_embedded(&link, item.description.as_deref()))
            }
            _ => item.description.clone(),
        };

        let issue = self
            .issues
            .create_issue(IssueDraft {
                title: prefix_with_glyph(GLYPH_INBOX, &item.title),
                description,
                state: Some(IssueState::Triage),
                target_date: item.start_time.map(|s| s.date_naive()),
                estimate_points: Some(item.size.points()),
            })
            .await?;

        Ok(issue.id)
    }

    /// Create the event side for an item, placed by the scheduler.
    async fn create_event(
        &self,
        item: &CanonicalItem,
        existing_events: &[ExternalEvent],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let slot = self.place(item, existing_events, now);

        let mut private_properties = BTreeMap::new();
        private_properties.insert(EVENT_PROP_UID.to_string(), item.uid.clone());
        if let Some(issue_id) = &item.issue_id {
            private_properties.insert(EVENT_PROP_LINKED_ISSUE.to_string(), issue_id.clone());
        }

        let event = self
            .events
            .create_event(
                &self.config.sync.calendar_id,
                EventDraft {
                    title: item.title.clone(),
                    description: item.description.clone(),
                    start: Some(slot.start),
                    end: Some(slot.end),
                    private_properties,
                },
            )
            .await?;

        Ok(event.id)
    }

    /// Retitle the event with the glyph of the issue's terminal state.
    async fn patch_event_title(&self, item: &CanonicalItem) -> Result<String> {
        let event_id = item
            .event_id
            .as_deref()
            .ok_or_else(|| TaskbridgeError::InvalidInput("patch-event without event id".into()))?;
        let glyph = item.issue_state.and_then(terminal_glyph).ok_or_else(|| {
            TaskbridgeError::InvalidInput("patch-event without terminal issue state".into())
        })?;

        self.events
            .update_event(
                event_id,
                EventPatch {
                    title: Some(prefix_with_glyph(glyph, &item.title)),
                    ..EventPatch::default()
                },
            )
            .await?;
        Ok(event_id.to_string())
    }

    /// Rewrite the issue's embedded cross-reference from current state.
    async fn patch_issue_metadata(&self, item: &CanonicalItem) -> Result<String> {
        let issue_id = item
            .issue_id
            .as_deref()
            .ok_or_else(|| TaskbridgeError::InvalidInput("patch-issue without issue id".into()))?;
        let (event_id, start) = match (&item.event_id, item.start_time) {
            (Some(event_id), Some(start)) => (event_id.clone(), start),
            _ => {
                return Err(TaskbridgeError::InvalidInput(
                    "patch-issue without a linked event".into(),
                ))
            }
        };

        let link = EmbeddedLink { event_id, start, duration_minutes: item.duration_minutes };
        self.issues
            .update_issue(
                issue_id,
                IssuePatch {
                    description: Some(with_embedded(&link, item.description.as_deref())),
                    ..IssuePatch::default()
                },
            )
            .await?;
        Ok(issue_id.to_string())
    }

    /// Composite: create the issue, then best-effort store the back-link in
    /// the event's private bag.
    async fn create_issue_and_link_event(&self, item: &CanonicalItem) -> Result<String> {
        let issue_id = self.create_issue(item).await?;

        if let Some(event_id) = &item.event_id {
            let mut private_properties = BTreeMap::new();
            private_properties.insert(EVENT_PROP_UID.to_string(), item.uid.clone());
            private_properties.insert(EVENT_PROP_LINKED_ISSUE.to_string(), issue_id.clone());

            let patch = EventPatch { private_properties, ..EventPatch::default() };
            if let Err(err) = self.events.update_event(event_id, patch).await {
                // Swallowed: the link self-heals on the next pass
                warn!(event_id = %event_id, error = %err, "secondary link patch failed");
            }
        }

        Ok(issue_id)
    }

    /// Composite: create the event, then best-effort embed the link in the
    /// issue's description.
    async fn create_event_and_link_issue(
        &self,
        item: &CanonicalItem,
        existing_events: &[ExternalEvent],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let slot = self.place(item, existing_events, now);

        let mut private_properties = BTreeMap::new();
        private_properties.insert(EVENT_PROP_UID.to_string(), item.uid.clone());
        if let Some(issue_id) = &item.issue_id {
            private_properties.insert(EVENT_PROP_LINKED_ISSUE.to_string(), issue_id.clone());
        }

        let event = self
            .events
            .create_event(
                &self.config.sync.calendar_id,
                EventDraft {
                    title: item.title.clone(),
                    description: item.description.clone(),
                    start: Some(slot.start),
                    end: Some(slot.end),
                    private_properties,
                },
            )
            .await?;

        if let Some(issue_id) = &item.issue_id {
            let link = EmbeddedLink {
                event_id: event.id.clone(),
                start: slot.start,
                duration_minutes: item.duration_minutes,
            };
            let patch = IssuePatch {
                description: Some(with_embedded(&link, item.description.as_deref())),
                ..IssuePatch::default()
            };
            if let Err(err) = self.issues.update_issue(issue_id, patch).await {
                warn!(issue_id = %issue_id, error = %err, "secondary link patch failed");
            }
        }

        Ok(event.id)
    }

    /// Composite: archive the overdue event into the history calendar (when
    /// one is configured), then reschedule the original into a fresh slot.
    async fn copy_to_history_and_reschedule(
        &self,
        item: &CanonicalItem,
        existing_events: &[ExternalEvent],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let event_id = item.event_id.as_deref().ok_or_else(|| {
            TaskbridgeError::InvalidInput("reschedule without event id".into())
        })?;

        if let Some(history_id) = &self.config.sync.history_calendar_id {
            self.events
                .copy_event(
                    event_id,
                    history_id,
                    Some(prefix_with_glyph(GLYPH_CARRIED_OVER, &item.title)),
                )
                .await?;
            debug!(event_id = %event_id, history = %history_id, "event archived to history");
        }

        let slot = self.place(item, existing_events, now);

        // Only the times move; the private bag (uid, link) rides along
        // untouched on the original event
        self.events
            .update_event(
                event_id,
                EventPatch {
                    start: Some(slot.start),
                    end: Some(slot.end),
                    ..EventPatch::default()
                },
            )
            .await?;

        if item.issue_id.is_some() {
            let mut moved = item.clone();
            moved.start_time = Some(slot.start);
            moved.end_time = Some(slot.end);
            if let Err(err) = self.patch_issue_metadata(&moved).await {
                warn!(uid = %item.uid, error = %err, "issue metadata refresh failed");
            }
        }

        Ok(event_id.to_string())
    }

    /// Run the scheduler for an item, preferring its current start date.
    fn place(
        &self,
        item: &CanonicalItem,
        existing_events: &[ExternalEvent],
        now: DateTime<Utc>,
    ) -> Slot {
        let preferred_date = item
            .start_time
            .map(|start| start.with_timezone(&self.config.scheduling.timezone).date_naive());
        let duration = if item.duration_minutes == 0 {
            item.size.minutes()
        } else {
            item.duration_minutes
        };
        find_slot(duration, preferred_date, existing_events, &self.config.scheduling, now)
    }
}
