//! JSON-file-backed pattern repository.
//!
//! Loads the full pattern map at open and rewrites the file on `flush`,
//! matching the open-at-session-start / flush-at-session-end lifecycle the
//! convergence controller drives. Recording between flushes mutates only
//! the in-memory map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Issue, Pattern};
use crate::domain::ports::PatternRepository;

/// Pattern store persisted as a single JSON document keyed by signature.
#[derive(Debug)]
pub struct JsonFilePatternRepository {
    path: PathBuf,
    patterns: RwLock<HashMap<String, Pattern>>,
}

impl JsonFilePatternRepository {
    /// Open the store, loading any existing pattern file. A missing file is
    /// an empty store.
    pub async fn open(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref().to_path_buf();
        let patterns = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| DomainError::StorageError(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(DomainError::StorageError(format!(
                    "{}: {e}",
                    path.display()
                )))
            }
        };
        debug!(path = %path.display(), "opened pattern store");
        Ok(Self {
            path,
            patterns: RwLock::new(patterns),
        })
    }
}

#[async_trait]
impl PatternRepository for JsonFilePatternRepository {
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

    async fn flush(&self) -> DomainResult<()> {
        let patterns = self.patterns.read().await;
        let text = serde_json::to_string_pretty(&*patterns)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::StorageError(e.to_string()))?;
        }
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| DomainError::StorageError(e.to_string()))?;
        debug!(
            path = %self.path.display(),
            count = patterns.len(),
            "flushed pattern store"
        );
        Ok(())
    }
}
