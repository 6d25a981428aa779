//! External API port interfaces
//!
//! The engine is handed two narrow capability interfaces and never touches a
//! concrete transport. The real HTTP/GraphQL clients implement these traits
//! outside this workspace; tests implement them in memory.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use taskbridge_domain::{ExternalEvent, ExternalIssue, IssueState, Result};

/// Partial payload for creating an issue.
#[derive(Debug, Clone, Default)]
pub struct IssueDraft {
    pub title: String,
    pub description: Option<String>,
    pub state: Option<IssueState>,
    pub target_date: Option<NaiveDate>,
    pub estimate_points: Option<u8>,
}

/// Partial payload for updating an issue. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<IssueState>,
    pub target_date: Option<NaiveDate>,
    pub estimate_points: Option<u8>,
}

/// Server-side filter for listing issues.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub states: Option<Vec<IssueState>>,
}

/// Partial payload for creating an event.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub private_properties: BTreeMap<String, String>,
}

/// Partial payload for updating an event. `None` fields are left untouched;
/// private properties are merged key by key.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub private_properties: BTreeMap<String, String>,
}

/// Capability interface over the issue-tracking system.
#[async_trait]
pub trait IssueClient: Send + Sync {
    /// Create a new issue from a partial payload.
    async fn create_issue(&self, draft: IssueDraft) -> Result<ExternalIssue>;

    /// Apply a partial update to an existing issue.
    async fn update_issue(&self, id: &str, patch: IssuePatch) -> Result<ExternalIssue>;

    /// List issues matching a filter.
    async fn list_issues(&self, filter: IssueFilter) -> Result<Vec<ExternalIssue>>;
}

/// Capability interface over the calendar system.
#[async_trait]
pub trait EventClient: Send + Sync {
    /// Create a new event from a partial payload.
    async fn create_event(&self, calendar_id: &str, draft: EventDraft) -> Result<ExternalEvent>;

    /// Apply a partial update to an existing event.
    async fn update_event(&self, id: &str, patch: EventPatch) -> Result<ExternalEvent>;

    /// List events in a calendar within a time range.
    async fn list_events(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ExternalEvent>>;

    /// Copy an event into another calendar, optionally retitling the copy.
    async fn copy_event(
        &self,
        id: &str,
        target_calendar_id: &str,
        title_override: Option<String>,
    ) -> Result<ExternalEvent>;
}
