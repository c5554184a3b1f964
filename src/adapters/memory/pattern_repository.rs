//! In-memory pattern repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Issue, Pattern};
use crate::domain::ports::PatternRepository;

/// Pattern store backed by a process-local map keyed by problem signature.
///
/// An explicit, injectable component rather than a module-global map;
/// entries are upserted and never deleted.
#[derive(Debug, Default)]
pub struct InMemoryPatternRepository {
    patterns: RwLock<HashMap<String, Pattern>>,
}

impl InMemoryPatternRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct signatures stored.
    pub async fn len(&self) -> usize {
        self.patterns.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.patterns.read().await.is_empty()
    }
}

#[async_trait]
impl PatternRepository for InMemoryPatternRepository {
    async fn find(&self, signature: &str) -> DomainResult<Vec<Pattern>> {
        Ok(self
            .patterns
            .read()
            .await
            .get(signature)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn find_by_category(&self, category: &str) -> DomainResult<Vec<Pattern>> {
        let mut matches: Vec<Pattern> = self
            .patterns
            .read()
            .await
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.problem_signature.cmp(&b.problem_signature));
        Ok(matches)
    }

    async fn record(
        &self,
        issue: &Issue,
        fix_applied: &str,
        succeeded: bool,
    ) -> DomainResult<Pattern> {
        let signature = issue.signature();
        let mut patterns = self.patterns.write().await;
        let pattern = patterns
            .entry(signature.clone())
            .and_modify(|p| p.record_application(fix_applied, succeeded))
            .or_insert_with(|| {
                Pattern::new(issue.category.clone(), signature, fix_applied, succeeded)
            });
        Ok(pattern.clone())
    }

    async fn all(&self) -> DomainResult<Vec<Pattern>> {
        let mut all: Vec<Pattern> = self.patterns.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.problem_signature.cmp(&b.problem_signature));
        Ok(all)
    }
}
