//! Port for the antipattern store.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Issue, Pattern};

/// Stores learned antipatterns keyed by issue signature.
///
/// The store never deletes entries and never enforces a success-rate
/// threshold; trusting a pattern is the caller's decision. Backing medium
/// is unconstrained (in-memory, flat file, database).
#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Patterns whose signature matches exactly.
    async fn find(&self, signature: &str) -> DomainResult<Vec<Pattern>>;

    /// Patterns in the given category.
    async fn find_by_category(&self, category: &str) -> DomainResult<Vec<Pattern>>;

    /// Record an application: creates a pattern if none matches the issue's
    /// signature, otherwise increments its application counters.
    async fn record(&self, issue: &Issue, fix_applied: &str, succeeded: bool)
        -> DomainResult<Pattern>;

    /// All stored patterns.
    async fn all(&self) -> DomainResult<Vec<Pattern>>;

    /// Flush buffered state to the backing medium. Called at session end;
    /// a no-op for purely in-memory stores.
    async fn flush(&self) -> DomainResult<()> {
        Ok(())
    }
}
