//! In-memory client adapters
//!
//! Full implementations of the issue and event ports over process-local
//! state. Used by the worker integration tests and by local dry runs where
//! no real backends are wired up. Events are stored per calendar so the
//! archive copy lands in an actual second calendar, not a flag.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskbridge_core::{
    EventClient, EventDraft, EventPatch, IssueClient, IssueDraft, IssueFilter, IssuePatch,
};
use taskbridge_domain::{
    EventStatus, ExternalEvent, ExternalIssue, IssueState, Result, TaskbridgeError,
};
use tokio::sync::Mutex;

/// In-memory issue tracker.
#[derive(Default, Clone)]
pub struct InMemoryIssueClient {
    issues: Arc<Mutex<Vec<ExternalIssue>>>,
    next_id: Arc<AtomicUsize>,
}

impl InMemoryIssueClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an issue, for test and dry-run setup.
    pub async fn with_issue(self, issue: ExternalIssue) -> Self {
        self.issues.lock().await.push(issue);
        self
    }

    /// All stored issues.
    pub async fn issues(&self) -> Vec<ExternalIssue> {
        self.issues.lock().await.clone()
    }
}

#[async_trait]
impl IssueClient for InMemoryIssueClient {
    async fn create_issue(&self, draft: IssueDraft) -> Result<ExternalIssue> {
        let id = format!("issue-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let issue = ExternalIssue {
            id,
            title: draft.title,
            description: draft.description,
            state: draft.state.unwrap_or(IssueState::Triage),
            target_date: draft.target_date,
            estimate_points: draft.estimate_points,
        };
        self.issues.lock().await.push(issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, id: &str, patch: IssuePatch) -> Result<ExternalIssue> {
        let mut issues = self.issues.lock().await;
        let issue = issues
            .iter_mut()
            .find(|issue| issue.id == id)
            .ok_or_else(|| TaskbridgeError::NotFound(format!("issue {id}")))?;

        if let Some(title) = patch.title {
            issue.title = title;
        }
        if let Some(description) = patch.description {
            issue.description = Some(description);
        }
        if let Some(state) = patch.state {
            issue.state = state;
        }
        if let Some(target_date) = patch.target_date {
            issue.target_date = Some(target_date);
        }
        if let Some(points) = patch.estimate_points {
            issue.estimate_points = Some(points);
        }
        Ok(issue.clone())
    }

    async fn list_issues(&self, filter: IssueFilter) -> Result<Vec<ExternalIssue>> {
        let issues = self.issues.lock().await;
        Ok(issues
            .iter()
            .filter(|issue| {
                filter.states.as_ref().map_or(true, |states| states.contains(&issue.state))
            })
            .cloned()
            .collect())
    }
}

/// In-memory calendar service holding one event list per calendar id.
#[derive(Default, Clone)]
pub struct InMemoryEventClient {
    calendars: Arc<Mutex<BTreeMap<String, Vec<ExternalEvent>>>>,
    next_id: Arc<AtomicUsize>,
}

impl InMemoryEventClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event into the given calendar.
    pub async fn with_event(self, calendar_id: &str, event: ExternalEvent) -> Self {
        self.calendars.lock().await.entry(calendar_id.to_string()).or_default().push(event);
        self
    }

    /// All events in one calendar.
    pub async fn events_in(&self, calendar_id: &str) -> Vec<ExternalEvent> {
        self.calendars.lock().await.get(calendar_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl EventClient for InMemoryEventClient {
    async fn create_event(&self, calendar_id: &str, draft: EventDraft) -> Result<ExternalEvent> {
        let start = draft
            .start
            .ok_or_else(|| TaskbridgeError::InvalidInput("event draft without start".into()))?;
        let id = format!("event-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let event = ExternalEvent {
            id,
            title: draft.title,
            description: draft.description,
            start,
            end: draft.end.unwrap_or(start),
            is_all_day: false,
            status: EventStatus::Confirmed,
            private_properties: draft.private_properties,
        };
        self.calendars
            .lock()
            .await
            .entry(calendar_id.to_string())
            .or_default()
            .push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: &str, patch: EventPatch) -> Result<ExternalEvent> {
        let mut calendars = self.calendars.lock().await;
        let event = calendars
            .values_mut()
            .flat_map(|events| events.iter_mut())
            .find(|event| event.id == id)
            .ok_or_else(|| TaskbridgeError::NotFound(format!("event {id}")))?;

        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = Some(description);
        }
        if let Some(start) = patch.start {
            event.start = start;
        }
        if let Some(end) = patch.end {
            event.end = end;
        }
        for (key, value) in patch.private_properties {
            event.private_properties.insert(key, value);
        }
        Ok(event.clone())
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ExternalEvent>> {
        let calendars = self.calendars.lock().await;
        Ok(calendars
            .get(calendar_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|event| event.start < to && event.end > from)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn copy_event(
        &self,
        id: &str,
        target_calendar_id: &str,
        title_override: Option<String>,
    ) -> Result<ExternalEvent> {
        let mut calendars = self.calendars.lock().await;
        let source = calendars
            .values()
            .flat_map(|events| events.iter())
            .find(|event| event.id == id)
            .cloned()
            .ok_or_else(|| TaskbridgeError::NotFound(format!("event {id}")))?;

        let mut copy = source;
        copy.id = format!("event-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        if let Some(title) = title_override {
            copy.title = title;
        }
        calendars.entry(target_calendar_id.to_string()).or_default().push(copy.clone());
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn event(id: &str, start: DateTime<Utc>) -> ExternalEvent {
        ExternalEvent {
            id: id.to_string(),
            title: "Planning".to_string(),
            description: None,
            start,
            end: start + Duration::minutes(30),
            is_all_day: false,
            status: EventStatus::Confirmed,
            private_properties: BTreeMap::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn list_events_is_scoped_to_calendar_and_window() {
        let client = InMemoryEventClient::new()
            .with_event("primary", event("in-window", now()))
            .await
            .with_event("primary", event("out-of-window", now() + Duration::days(30)))
            .await
            .with_event("other", event("other-calendar", now()))
            .await;

        let listed = client
            .list_events("primary", now() - Duration::hours(1), now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "in-window");
    }

    #[tokio::test]
    async fn copy_event_lands_in_the_target_calendar() {
        let client = InMemoryEventClient::new().with_event("primary", event("evt-1", now())).await;

        let copy = client
            .copy_event("evt-1", "history", Some("🔁 Planning".to_string()))
            .await
            .unwrap();

        assert_ne!(copy.id, "evt-1");
        assert_eq!(copy.title, "🔁 Planning");
        let archived = client.events_in("history").await;
        assert_eq!(archived.len(), 1);
        assert_eq!(client.events_in("primary").await.len(), 1, "source is untouched");
    }

    #[tokio::test]
    async fn update_missing_event_is_not_found() {
        let client = InMemoryEventClient::new();
        let result = client.update_event("nope", EventPatch::default()).await;
        assert!(matches!(result, Err(TaskbridgeError::NotFound(_))));
    }

    #[tokio::test]
    async fn issue_filter_narrows_by_state() {
        let client = InMemoryIssueClient::new();
        client
            .create_issue(IssueDraft {
                title: "A".to_string(),
                description: None,
                state: Some(IssueState::Scheduled),
                target_date: None,
                estimate_points: None,
            })
            .await
            .unwrap();
        client
            .create_issue(IssueDraft {
                title: "B".to_string(),
                description: None,
                state: Some(IssueState::Done),
                target_date: None,
                estimate_points: None,
            })
            .await
            .unwrap();

        let scheduled = client
            .list_issues(IssueFilter { states: Some(vec![IssueState::Scheduled]) })
            .await
            .unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].title, "A");

        let all = client.list_issues(IssueFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
