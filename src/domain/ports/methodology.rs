//! Port for pluggable review methodologies.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Deliverable, Issue};

/// An independent review procedure invoked during convergence passes.
///
/// Domain-specific checks (style, accessibility, links, schema...) plug in
/// here; the core only cares about the issue list a pass reports.
#[async_trait]
pub trait Methodology: Send + Sync {
    /// Stable name used for no-reuse bookkeeping within a clean streak.
    fn name(&self) -> &str;

    /// Review the deliverables and report any issues found.
    async fn review(&self, deliverables: &[Deliverable]) -> DomainResult<Vec<Issue>>;
}
