//! In-memory implementations of the two client ports.
//!
//! Behave like tiny fake backends: creates allocate sequential ids, updates
//! merge partial payloads, and the stored state can be read back to drive a
//! second simulated pass. Deterministic by construction.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskbridge_core::{
    EventClient, EventDraft, EventPatch, IssueClient, IssueDraft, IssueFilter, IssuePatch,
};
use taskbridge_domain::{
    EventStatus, ExternalEvent, ExternalIssue, IssueState, Result as DomainResult,
    TaskbridgeError,
};

/// In-memory mock for [`IssueClient`].
#[derive(Default, Clone)]
pub struct InMemoryIssueClient {
    issues: Arc<Mutex<Vec<ExternalIssue>>>,
    next_id: Arc<AtomicUsize>,
}

impl InMemoryIssueClient {
    pub fn new(issues: Vec<ExternalIssue>) -> Self {
        Self { issues: Arc::new(Mutex::new(issues)), next_id: Arc::new(AtomicUsize::new(0)) }
    }

    /// Convenience helper for seeding a single issue.
    pub fn with_issue(self, issue: ExternalIssue) -> Self {
        self.issues.lock().unwrap().push(issue);
        self
    }

    /// Snapshot of the stored issues, as a fetch would return them.
    pub fn snapshot(&self) -> Vec<ExternalIssue> {
        self.issues.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueClient for InMemoryIssueClient {
    async fn create_issue(&self, draft: IssueDraft) -> DomainResult<ExternalIssue> {
        let id = format!("iss-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let issue = ExternalIssue {
            id,
            title: draft.title,
            description: draft.description,
            state: draft.state.unwrap_or(IssueState::Triage),
            target_date: draft.target_date,
            estimate_points: draft.estimate_points,
        };
        self.issues.lock().unwrap().push(issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, id: &str, patch: IssuePatch) -> DomainResult<ExternalIssue> {
        let mut issues = self.issues.lock().unwrap();
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

    async fn list_issues(&self, filter: IssueFilter) -> DomainResult<Vec<ExternalIssue>> {
        let issues = self.issues.lock().unwrap();
        Ok(issues
            .iter()
            .filter(|issue| {
                filter.states.as_ref().map_or(true, |states| states.contains(&issue.state))
            })
            .cloned()
            .collect())
    }
}

/// In-memory mock for [`EventClient`].
#[derive(Default, Clone)]
pub struct InMemoryEventClient {
    events: Arc<Mutex<Vec<ExternalEvent>>>,
    copies: Arc<Mutex<Vec<ExternalEvent>>>,
    next_id: Arc<AtomicUsize>,
}

impl InMemoryEventClient {
    pub fn new(events: Vec<ExternalEvent>) -> Self {
        Self {
            events: Arc::new(Mutex::new(events)),
            copies: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Convenience helper for seeding a single event.
    pub fn with_event(self, event: ExternalEvent) -> Self {
        self.events.lock().unwrap().push(event);
        self
    }

    /// Snapshot of the primary-calendar events.
    pub fn snapshot(&self) -> Vec<ExternalEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events copied into secondary calendars.
    pub fn copied(&self) -> Vec<ExternalEvent> {
        self.copies.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventClient for InMemoryEventClient {
    async fn create_event(
        &self,
        _calendar_id: &str,
        draft: EventDraft,
    ) -> DomainResult<ExternalEvent> {
        let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let start = draft
            .start
            .ok_or_else(|| TaskbridgeError::InvalidInput("event draft without start".into()))?;
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
        self.events.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: &str, patch: EventPatch) -> DomainResult<ExternalEvent> {
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
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
        _calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<ExternalEvent>> {
        let events = self.events.lock().unwrap();
        Ok(events.iter().filter(|event| event.start < to && event.end > from).cloned().collect())
    }

    async fn copy_event(
        &self,
        id: &str,
        _target_calendar_id: &str,
        title_override: Option<String>,
    ) -> DomainResult<ExternalEvent> {
        let source = {
            let events = self.events.lock().unwrap();
            events
                .iter()
                .find(|event| event.id == id)
                .cloned()
                .ok_or_else(|| TaskbridgeError::NotFound(format!("event {id}")))?
        };
        let mut copy = source;
        copy.id = format!("evt-copy-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        if let Some(title) = title_override {
            copy.title = title;
        }
        self.copies.lock().unwrap().push(copy.clone());
        Ok(copy)
    }
}
