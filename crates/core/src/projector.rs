//! Snapshot projector
//!
//! Fuses the two external snapshots into the canonical model. Pure and
//! deterministic: identical inputs (including `now`) always yield identical
//! uid assignments for already-linked pairs and identical phase
//! classifications. No I/O happens here.
//!
//! Linking runs in fixed priority order so every entity is consumed at most
//! once:
//! 1. pairs recorded in the calendar's private bag (`linkedIssueId`)
//! 2. pairs recorded in issue-side embedded metadata
//! 3. short-code fallback (non-authoritative)
//! 4. remaining issues as issue-only, remaining events as event-only
//!
//! Calendar-side metadata is authoritative over issue-side metadata when the
//! two disagree: the calendar bag is also where the uid lives.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use taskbridge_domain::constants::OVERDUE_GRACE_HOURS;
use taskbridge_domain::utils::metadata::{extract_short_code, strip_embedded, EmbeddedLink};
use taskbridge_domain::utils::title::strip_status_glyph;
use taskbridge_domain::{
    CanonicalItem, Config, EventStatus, ExternalEvent, ExternalIssue, IssueState, Phase,
    SizeBucket,
};
use tracing::debug;
use uuid::Uuid;

/// Source of freshly minted canonical uids.
///
/// Injected so tests can substitute a sequential source and assert on exact
/// output; production uses [`UuidSource`].
pub trait UidSource {
    /// Mint a new uid, unique within at least this pass.
    fn mint(&self) -> String;
}

/// Default uid source backed by random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSource;

impl UidSource for UuidSource {
    fn mint(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Output of one projection pass.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub items: Vec<CanonicalItem>,
    /// Issues whose embedded metadata pointed at an event that no longer
    /// exists. Still projected as issue-only; reported for telemetry.
    pub orphaned_issues: Vec<String>,
    /// Cancelled events excluded before linking.
    pub orphaned_events: Vec<String>,
}

/// Fuse the two snapshots into canonical items.
///
/// Invariants on the output: every item has at least one back-reference set,
/// uids are unique, and no two items share an `issue_id` or an `event_id`.
pub fn project(
    issues: &[ExternalIssue],
    events: &[ExternalEvent],
    now: DateTime<Utc>,
    config: &Config,
    ids: &dyn UidSource,
) -> Projection {
    let mut projection = Projection::default();

    let live_events: Vec<&ExternalEvent> = events
        .iter()
        .filter(|event| match event.status {
            EventStatus::Confirmed => true,
            EventStatus::Cancelled => {
                projection.orphaned_events.push(event.id.clone());
                false
            }
        })
        .collect();

    let events_by_id: HashMap<&str, &ExternalEvent> =
        live_events.iter().map(|event| (event.id.as_str(), *event)).collect();
    let issues_by_id: HashMap<&str, &ExternalIssue> =
        issues.iter().map(|issue| (issue.id.as_str(), issue)).collect();

    let mut consumed_issues: HashSet<&str> = HashSet::new();
    let mut consumed_events: HashSet<&str> = HashSet::new();

    // Pass 1: calendar-side links (authoritative, carries the uid)
    for event in &live_events {
        let Some(issue_id) = event.linked_issue_id() else { continue };
        if consumed_events.contains(event.id.as_str()) {
            continue;
        }
        let Some(issue) = issues_by_id.get(issue_id) else { continue };
        if consumed_issues.contains(issue.id.as_str()) {
            continue;
        }

        consumed_events.insert(event.id.as_str());
        consumed_issues.insert(issue.id.as_str());
        let uid = event.uid().map_or_else(|| ids.mint(), str::to_string);
        projection.items.push(fuse(Some(issue), Some(event), uid, now, config));
    }

    // Pass 2: issue-side embedded links; stale pointers are not errors
    for issue in issues {
        if consumed_issues.contains(issue.id.as_str()) {
            continue;
        }
        let Some(link) = EmbeddedLink::from_description(issue.description.as_deref()) else {
            continue;
        };

        match events_by_id.get(link.event_id.as_str()) {
            Some(event) if !consumed_events.contains(event.id.as_str()) => {
                consumed_events.insert(event.id.as_str());
                consumed_issues.insert(issue.id.as_str());
                let uid = event.uid().map_or_else(|| ids.mint(), str::to_string);
                projection.items.push(fuse(Some(issue), Some(event), uid, now, config));
            }
            Some(_) => {
                // The event was claimed by a calendar-side link to a
                // different issue; that side wins. This issue falls through
                // to the issue-only pass.
            }
            None => {
                debug!(issue_id = %issue.id, event_id = %link.event_id, "stale embedded link");
                consumed_issues.insert(issue.id.as_str());
                projection.orphaned_issues.push(issue.id.clone());
                projection.items.push(fuse(Some(issue), None, ids.mint(), now, config));
            }
        }
    }

    // Pass 3: short-code fallback. Only pairs entities nothing else claimed,
    // so the at-most-one-pairing invariant holds.
    let mut event_by_code: HashMap<String, &ExternalEvent> = HashMap::new();
    for event in &live_events {
        if consumed_events.contains(event.id.as_str()) {
            continue;
        }
        let haystack = match &event.description {
            Some(description) => format!("{} {description}", event.title),
            None => event.title.clone(),
        };
        if let Some(code) = extract_short_code(&haystack) {
            event_by_code.entry(code.0).or_insert(event);
        }
    }
    for issue in issues {
        if consumed_issues.contains(issue.id.as_str()) {
            continue;
        }
        let haystack = match &issue.description {
            Some(description) => format!("{} {description}", issue.title),
            None => issue.title.clone(),
        };
        let Some(code) = extract_short_code(&haystack) else { continue };
        let Some(event) = event_by_code.remove(&code.0) else { continue };
        if consumed_events.contains(event.id.as_str()) {
            continue;
        }

        debug!(issue_id = %issue.id, event_id = %event.id, code = %code.0, "short-code pairing");
        consumed_events.insert(event.id.as_str());
        consumed_issues.insert(issue.id.as_str());
        let uid = event.uid().map_or_else(|| ids.mint(), str::to_string);
        projection.items.push(fuse(Some(issue), Some(event), uid, now, config));
    }

    // Pass 4: remaining issues
    for issue in issues {
        if consumed_issues.contains(issue.id.as_str()) {
            continue;
        }
        projection.items.push(fuse(Some(issue), None, ids.mint(), now, config));
    }

    // Pass 5: remaining events
    for event in &live_events {
        if consumed_events.contains(event.id.as_str()) {
            continue;
        }
        let uid = event.uid().map_or_else(|| ids.mint(), str::to_string);
        projection.items.push(fuse(None, Some(event), uid, now, config));
    }

    debug!(
        items = projection.items.len(),
        orphaned_issues = projection.orphaned_issues.len(),
        orphaned_events = projection.orphaned_events.len(),
        "projection complete"
    );

    projection
}

/// Synthesize one canonical item from an (issue, event) pair.
///
/// At least one side must be present; callers guarantee this by
/// construction.
fn fuse(
    issue: Option<&ExternalIssue>,
    event: Option<&ExternalEvent>,
    uid: String,
    now: DateTime<Utc>,
    config: &Config,
) -> CanonicalItem {
    // Title: issue wins; both sides are glyph-stripped before storage
    let title = issue
        .map(|i| strip_status_glyph(&i.title))
        .or_else(|| event.map(|e| strip_status_glyph(&e.title)))
        .unwrap_or_default();

    // Description: issue wins (minus its embedded metadata line)
    let description = issue
        .and_then(|i| i.description.as_deref())
        .map(strip_embedded)
        .filter(|d| !d.is_empty())
        .or_else(|| event.and_then(|e| e.description.clone()));

    // Start/end: event timestamps win; an issue target date becomes a
    // day-start in the configured timezone with no end
    let (start_time, end_time) = match (event, issue) {
        (Some(e), _) => (Some(e.start), Some(e.end)),
        (None, Some(i)) => (i.target_date.and_then(|d| local_day_start(d, config)), None),
        (None, None) => (None, None),
    };

    let event_minutes = event.filter(|e| !e.is_all_day).map(ExternalEvent::duration_minutes);
    let points = issue.and_then(|i| i.estimate_points);
    let size = if points.is_some() {
        SizeBucket::from_points(points)
    } else if let Some(minutes) = event_minutes {
        SizeBucket::from_minutes(minutes)
    } else {
        SizeBucket::default()
    };
    let duration_minutes = event_minutes.unwrap_or_else(|| size.minutes());

    let issue_state = issue.map(|i| i.state);
    let phase = classify_phase(issue, event, now);

    CanonicalItem {
        uid,
        title,
        description,
        start_time,
        end_time,
        duration_minutes,
        size,
        issue_id: issue.map(|i| i.id.clone()),
        event_id: event.map(|e| e.id.clone()),
        event_title: event.map(|e| e.title.clone()),
        issue_state,
        phase,
        last_observed_at: now,
    }
}

/// Derive the phase for a pair. Completion is checked before overdue so a
/// finished item is never misreported as overdue.
fn classify_phase(
    issue: Option<&ExternalIssue>,
    event: Option<&ExternalEvent>,
    now: DateTime<Utc>,
) -> Phase {
    match (issue, event) {
        (None, Some(_)) => Phase::EventOnly,
        (Some(_), None) | (None, None) => Phase::IssueOnly,
        (Some(issue), Some(event)) => {
            if issue.state.is_terminal() {
                Phase::Completed
            } else if now - event.end > chrono::Duration::hours(OVERDUE_GRACE_HOURS)
                && issue.state != IssueState::Done
            {
                Phase::Overdue
            } else {
                Phase::Active
            }
        }
    }
}

fn local_day_start(date: chrono::NaiveDate, config: &Config) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    config
        .scheduling
        .timezone
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::{NaiveDate, TimeZone};

    use super::*;

    /// Deterministic uid source for exact-output assertions.
    struct SequentialUids(AtomicU32);

    impl SequentialUids {
        fn new() -> Self {
            Self(AtomicU32::new(0))
        }
    }

    impl UidSource for SequentialUids {
        fn mint(&self) -> String {
            format!("uid-{}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn issue(id: &str) -> ExternalIssue {
        ExternalIssue {
            id: id.to_string(),
            title: "Quarterly report".to_string(),
            description: None,
            state: IssueState::Scheduled,
            target_date: None,
            estimate_points: None,
        }
    }

    fn event(id: &str) -> ExternalEvent {
        ExternalEvent {
            id: id.to_string(),
            title: "Quarterly report".to_string(),
            description: None,
            start: Utc.with_ymd_and_hms(2025, 3, 11, 10, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 11, 11, 0, 0).unwrap(),
            is_all_day: false,
            status: EventStatus::Confirmed,
            private_properties: BTreeMap::new(),
        }
    }

    fn linked_event(id: &str, issue_id: &str, uid: Option<&str>) -> ExternalEvent {
        let mut e = event(id);
        e.private_properties.insert("linkedIssueId".to_string(), issue_id.to_string());
        if let Some(uid) = uid {
            e.private_properties.insert("uid".to_string(), uid.to_string());
        }
        e
    }

    #[test]
    fn calendar_side_link_carries_uid_forward() {
        let issues = vec![issue("iss-1")];
        let events = vec![linked_event("evt-1", "iss-1", Some("uid-stable"))];

        let projection =
            project(&issues, &events, now(), &Config::default(), &SequentialUids::new());

        assert_eq!(projection.items.len(), 1);
        let item = &projection.items[0];
        assert_eq!(item.uid, "uid-stable");
        assert_eq!(item.issue_id.as_deref(), Some("iss-1"));
        assert_eq!(item.event_id.as_deref(), Some("evt-1"));
        assert_eq!(item.phase, Phase::Active);
    }

    #[test]
    fn issue_side_link_pairs_when_calendar_bag_is_empty() {
        let link = EmbeddedLink {
            event_id: "evt-1".to_string(),
            start: now(),
            duration_minutes: 60,
        };
        let mut iss = issue("iss-1");
        iss.description = Some(link.serialize());
        let events = vec![event("evt-1")];

        let projection =
            project(&[iss], &events, now(), &Config::default(), &SequentialUids::new());

        assert_eq!(projection.items.len(), 1);
        assert_eq!(projection.items[0].event_id.as_deref(), Some("evt-1"));
        assert_eq!(projection.items[0].phase, Phase::Active);
    }

    #[test]
    fn stale_issue_link_becomes_issue_only_and_is_reported() {
        let link = EmbeddedLink {
            event_id: "evt-gone".to_string(),
            start: now(),
            duration_minutes: 60,
        };
        let mut iss = issue("iss-1");
        iss.description = Some(link.serialize());

        let projection = project(&[iss], &[], now(), &Config::default(), &SequentialUids::new());

        assert_eq!(projection.items.len(), 1);
        assert_eq!(projection.items[0].phase, Phase::IssueOnly);
        assert_eq!(projection.orphaned_issues, vec!["iss-1".to_string()]);
    }

    #[test]
    fn calendar_side_wins_when_links_disagree() {
        // evt-1 claims iss-1 via the calendar bag; iss-2 claims evt-1 via
        // embedded metadata. The calendar side is authoritative.
        let link = EmbeddedLink {
            event_id: "evt-1".to_string(),
            start: now(),
            duration_minutes: 60,
        };
        let iss1 = issue("iss-1");
        let mut iss2 = issue("iss-2");
        iss2.state = IssueState::Triage;
        iss2.description = Some(link.serialize());
        let events = vec![linked_event("evt-1", "iss-1", None)];

        let projection =
            project(&[iss1, iss2], &events, now(), &Config::default(), &SequentialUids::new());

        assert_eq!(projection.items.len(), 2);
        let paired = projection
            .items
            .iter()
            .find(|i| i.issue_id.as_deref() == Some("iss-1"))
            .unwrap();
        assert_eq!(paired.event_id.as_deref(), Some("evt-1"));
        let loser = projection
            .items
            .iter()
            .find(|i| i.issue_id.as_deref() == Some("iss-2"))
            .unwrap();
        assert_eq!(loser.phase, Phase::IssueOnly);
        assert_eq!(loser.event_id, None);
    }

    #[test]
    fn short_code_pairs_leftovers() {
        let mut iss = issue("iss-1");
        iss.title = "OPS-142 fix login flow".to_string();
        let mut evt = event("evt-1");
        evt.title = "Work on OPS-142".to_string();

        let projection =
            project(&[iss], &[evt], now(), &Config::default(), &SequentialUids::new());

        assert_eq!(projection.items.len(), 1);
        assert_eq!(projection.items[0].issue_id.as_deref(), Some("iss-1"));
        assert_eq!(projection.items[0].event_id.as_deref(), Some("evt-1"));
    }

    #[test]
    fn cancelled_events_are_excluded_and_reported() {
        let mut evt = event("evt-1");
        evt.status = EventStatus::Cancelled;

        let projection = project(&[], &[evt], now(), &Config::default(), &SequentialUids::new());

        assert!(projection.items.is_empty());
        assert_eq!(projection.orphaned_events, vec!["evt-1".to_string()]);
    }

    #[test]
    fn pairing_is_exclusive() {
        // Two events both claim the same issue; only one pair forms.
        let issues = vec![issue("iss-1")];
        let events = vec![
            linked_event("evt-1", "iss-1", None),
            linked_event("evt-2", "iss-1", None),
        ];

        let projection =
            project(&issues, &events, now(), &Config::default(), &SequentialUids::new());

        let issue_refs: Vec<_> =
            projection.items.iter().filter_map(|i| i.issue_id.as_deref()).collect();
        assert_eq!(issue_refs, vec!["iss-1"]);
        let event_refs: Vec<_> =
            projection.items.iter().filter_map(|i| i.event_id.as_deref()).collect();
        assert_eq!(event_refs.len(), 2);
    }

    #[test]
    fn projection_is_deterministic() {
        let issues = vec![issue("iss-1"), issue("iss-2")];
        let events = vec![linked_event("evt-1", "iss-1", Some("u1")), event("evt-2")];
        let config = Config::default();

        let a = project(&issues, &events, now(), &config, &SequentialUids::new());
        let b = project(&issues, &events, now(), &config, &SequentialUids::new());

        assert_eq!(a.items, b.items);
        assert_eq!(a.orphaned_issues, b.orphaned_issues);
        assert_eq!(a.orphaned_events, b.orphaned_events);
    }

    #[test]
    fn title_fusion_prefers_issue_and_strips_glyphs() {
        let mut iss = issue("iss-1");
        iss.title = "📥 Quarterly report".to_string();
        let mut evt = linked_event("evt-1", "iss-1", None);
        evt.title = "✅ Old calendar title".to_string();

        let projection =
            project(&[iss], &[evt], now(), &Config::default(), &SequentialUids::new());

        assert_eq!(projection.items[0].title, "Quarterly report");
    }

    #[test]
    fn issue_points_override_event_duration_bucket() {
        let mut iss = issue("iss-1");
        iss.estimate_points = Some(8);
        // 60-minute event would be M without the explicit estimate
        let evt = linked_event("evt-1", "iss-1", None);

        let projection =
            project(&[iss], &[evt], now(), &Config::default(), &SequentialUids::new());

        assert_eq!(projection.items[0].size, SizeBucket::Xl);
        assert_eq!(projection.items[0].duration_minutes, 60);
    }

    #[test]
    fn issue_only_uses_target_date_as_day_start() {
        let mut iss = issue("iss-1");
        iss.target_date = NaiveDate::from_ymd_opt(2025, 3, 12);

        let projection = project(&[iss], &[], now(), &Config::default(), &SequentialUids::new());

        let item = &projection.items[0];
        assert_eq!(item.start_time, Utc.with_ymd_and_hms(2025, 3, 12, 0, 0, 0).latest());
        assert_eq!(item.end_time, None);
        assert_eq!(item.duration_minutes, 30);
        assert_eq!(item.size, SizeBucket::S);
    }

    #[test]
    fn phase_table_is_exhaustive_and_ordered() {
        let base_event = linked_event("evt-1", "iss-1", None);

        // completed beats overdue: terminal state on a long-past event
        let mut done = issue("iss-1");
        done.state = IssueState::Failed;
        let mut past = base_event.clone();
        past.start = now() - chrono::Duration::hours(40);
        past.end = now() - chrono::Duration::hours(30);
        let projection =
            project(&[done], &[past.clone()], now(), &Config::default(), &SequentialUids::new());
        assert_eq!(projection.items[0].phase, Phase::Completed);

        // non-terminal state on the same event is overdue
        let projection = project(
            &[issue("iss-1")],
            &[past.clone()],
            now(),
            &Config::default(),
            &SequentialUids::new(),
        );
        assert_eq!(projection.items[0].phase, Phase::Overdue);

        // within the 24h grace window it stays active
        let mut recent = base_event;
        recent.start = now() - chrono::Duration::hours(13);
        recent.end = now() - chrono::Duration::hours(12);
        let projection = project(
            &[issue("iss-1")],
            &[recent],
            now(),
            &Config::default(),
            &SequentialUids::new(),
        );
        assert_eq!(projection.items[0].phase, Phase::Active);
    }
}
