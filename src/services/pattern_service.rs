//! Pattern service: advisory known-fix lookup over the pattern repository.

use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Issue, Pattern};
use crate::domain::ports::PatternRepository;

/// Wraps a [`PatternRepository`] with the bookkeeping conventions the
/// convergence controller relies on.
///
/// The `min_success_rate` filter is advisory: it only affects what
/// `known_fix` surfaces, never what the store keeps.
pub struct PatternService<P: PatternRepository> {
    repo: Arc<P>,
    min_success_rate: f64,
}

impl<P: PatternRepository> PatternService<P> {
    /// Service with no success-rate filtering.
    pub fn new(repo: Arc<P>) -> Self {
        Self {
            repo,
            min_success_rate: 0.0,
        }
    }

    /// Only surface known fixes at or above this success rate.
    #[must_use]
    pub fn with_min_success_rate(mut self, rate: f64) -> Self {
        self.min_success_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// A previously learned fix for this issue, if one is trusted enough.
    pub async fn known_fix(&self, issue: &Issue) -> DomainResult<Option<Pattern>> {
        let matches = self.repo.find(&issue.signature()).await?;
        Ok(matches
            .into_iter()
            .find(|p| p.total_applications > 0 && p.success_rate() >= self.min_success_rate))
    }

    /// Record a freshly discovered issue as a candidate antipattern.
    ///
    /// The fix has not been applied yet, so the application counts as
    /// unsuccessful until [`Self::mark_resolved`] upgrades it.
    pub async fn record_candidate(&self, issue: &Issue, proposed_fix: &str) -> DomainResult<Pattern> {
        debug!(signature = %issue.signature(), "recording candidate antipattern");
        self.repo.record(issue, proposed_fix, false).await
    }

    /// Record that an issue's fix held up (the session converged after it).
    pub async fn mark_resolved(&self, issue: &Issue, fix_applied: &str) -> DomainResult<Pattern> {
        self.repo.record(issue, fix_applied, true).await
    }

    /// Flush the underlying store. Called at session end.
    pub async fn flush(&self) -> DomainResult<()> {
        self.repo.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPatternRepository;
    use crate::domain::models::Severity;

    fn issue() -> Issue {
        Issue::new("missing alt", "index.html", Severity::Error, "a11y")
    }

    #[tokio::test]
    async fn candidate_then_resolution_builds_success_rate() {
        let service = PatternService::new(Arc::new(InMemoryPatternRepository::new()));

        service.record_candidate(&issue(), "add alt text").await.unwrap();
        let resolved = service.mark_resolved(&issue(), "add alt text").await.unwrap();

        assert_eq!(resolved.total_applications, 2);
        assert_eq!(resolved.success_count, 1);
    }

    #[tokio::test]
    async fn low_success_patterns_are_filtered_from_known_fix() {
        let repo = Arc::new(InMemoryPatternRepository::new());
        let service = PatternService::new(repo.clone()).with_min_success_rate(0.6);

        // One failure, one success: rate 0.5, below the bar.
        service.record_candidate(&issue(), "add alt text").await.unwrap();
        service.mark_resolved(&issue(), "add alt text").await.unwrap();
        assert!(service.known_fix(&issue()).await.unwrap().is_none());

        // Two more successes push it over.
        service.mark_resolved(&issue(), "add alt text").await.unwrap();
        service.mark_resolved(&issue(), "add alt text").await.unwrap();
        let known = service.known_fix(&issue()).await.unwrap().unwrap();
        assert_eq!(known.prevention_or_fix, "add alt text");
    }

    #[tokio::test]
    async fn unknown_issue_has_no_known_fix() {
        let service = PatternService::new(Arc::new(InMemoryPatternRepository::new()));
        assert!(service.known_fix(&issue()).await.unwrap().is_none());
    }
}
