//! Reconcile worker
//!
//! Drives one complete reconciliation pass: fetch both snapshots, project,
//! diff, actuate, summarize. A failed snapshot fetch aborts the pass (stale
//! input would produce wrong operations); failures past that point are
//! per-operation and never abort.
//!
//! The worker holds no state between passes and schedules nothing itself;
//! the caller decides when `run_once` runs. Re-running a pass is always
//! safe: the operations the diff engine derives are idempotent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskbridge_core::{
    compute_operations, project, Actuator, EventClient, IssueClient, IssueFilter, UuidSource,
};
use taskbridge_domain::{Config, PassSummary, Result};
use tracing::{debug, info, instrument};

/// One-shot reconciliation driver over the two injected clients.
pub struct ReconcileWorker {
    issues: Arc<dyn IssueClient>,
    events: Arc<dyn EventClient>,
    config: Config,
}

impl ReconcileWorker {
    /// Create a new worker over the injected clients.
    pub fn new(issues: Arc<dyn IssueClient>, events: Arc<dyn EventClient>, config: Config) -> Self {
        Self { issues, events, config }
    }

    /// Run one complete pass at the given observation time.
    ///
    /// # Errors
    /// Returns an error only when a snapshot fetch fails; operation failures
    /// are reported inside the summary instead.
    #[instrument(skip(self, now), fields(calendar = %self.config.sync.calendar_id))]
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<PassSummary> {
        let started_at = now;
        let from = now - chrono::Duration::hours(i64::from(self.config.sync.lookback_hours));
        let to = now + chrono::Duration::hours(i64::from(self.config.sync.lookahead_hours));

        // Fatal on either fetch: a pass over half a snapshot is worse than
        // no pass at all
        let events = self.events.list_events(&self.config.sync.calendar_id, from, to).await?;
        let issues = self.issues.list_issues(IssueFilter::default()).await?;
        debug!(events = events.len(), issues = issues.len(), "snapshots fetched");

        let projection = project(&issues, &events, now, &self.config, &UuidSource);
        let operations = compute_operations(&projection.items);

        let actuator = Actuator::new(
            Arc::clone(&self.issues),
            Arc::clone(&self.events),
            self.config.clone(),
        );
        let results = actuator.execute(&operations, &events, now).await;

        let succeeded = results.iter().filter(|result| result.success).count();
        let summary = PassSummary {
            items: projection.items.len(),
            operations: operations.len(),
            succeeded,
            failed: results.len() - succeeded,
            orphaned_issues: projection.orphaned_issues,
            orphaned_events: projection.orphaned_events,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            items = summary.items,
            operations = summary.operations,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "reconciliation pass complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{InMemoryEventClient, InMemoryIssueClient};

    #[tokio::test]
    async fn empty_snapshots_produce_an_empty_summary() {
        let worker = ReconcileWorker::new(
            Arc::new(InMemoryIssueClient::new()),
            Arc::new(InMemoryEventClient::new()),
            Config::default(),
        );

        let summary = worker.run_once(Utc::now()).await.unwrap();

        assert_eq!(summary.items, 0);
        assert_eq!(summary.operations, 0);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
        assert!(summary.orphaned_issues.is_empty());
        assert!(summary.orphaned_events.is_empty());
        assert!(summary.finished_at >= summary.started_at);
    }
}
