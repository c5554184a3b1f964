//! Resumable batch processing with periodic checkpoints.
//!
//! Long item batches snapshot their progress every `every` items through a
//! [`CheckpointRepository`]. After an abnormal termination, `resume` skips
//! everything at or before the checkpointed position and appends fresh
//! results, producing output identical to an uninterrupted run.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Checkpoint, CheckpointConfig};
use crate::domain::ports::CheckpointRepository;

/// Processes ordered item batches with periodic checkpoints.
pub struct BatchProcessor<C: CheckpointRepository> {
    repo: Arc<C>,
    every: usize,
}

impl<C: CheckpointRepository> BatchProcessor<C> {
    /// Create a processor snapshotting through `repo` per `config`.
    pub fn new(repo: Arc<C>, config: &CheckpointConfig) -> Self {
        Self {
            repo,
            every: config.every.max(1),
        }
    }

    /// Process `items` in order, checkpointing every `every` items and
    /// clearing the checkpoint on successful completion.
    ///
    /// On error the checkpoint taken at the last snapshot boundary remains
    /// in the repository for a later [`Self::resume`].
    pub async fn process_with_checkpoint<I, R, F, Fut>(
        &self,
        batch_id: &str,
        items: &[I],
        mut f: F,
    ) -> DomainResult<Vec<R>>
    where
        R: Serialize + DeserializeOwned,
        F: FnMut(&I) -> Fut,
        Fut: Future<Output = DomainResult<R>>,
    {
        self.run(batch_id, items, 0, Vec::new(), &mut f).await
    }

    /// Resume a batch after abnormal termination.
    ///
    /// Items at or before the checkpointed position are skipped; their
    /// results come from the checkpoint. Without a checkpoint this is a
    /// plain `process_with_checkpoint`.
    pub async fn resume<I, R, F, Fut>(
        &self,
        batch_id: &str,
        items: &[I],
        mut f: F,
    ) -> DomainResult<Vec<R>>
    where
        R: Serialize + DeserializeOwned,
        F: FnMut(&I) -> Fut,
        Fut: Future<Output = DomainResult<R>>,
    {
        let Some(checkpoint) = self.repo.load(batch_id).await? else {
            debug!(batch_id, "no checkpoint found, processing from the start");
            return self.run(batch_id, items, 0, Vec::new(), &mut f).await;
        };

        if checkpoint.position >= items.len() {
            return Err(DomainError::CheckpointCorrupt(format!(
                "checkpoint position {} exceeds batch of {} items",
                checkpoint.position,
                items.len()
            )));
        }

        let results: Vec<R> = checkpoint
            .partial_results
            .into_iter()
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| DomainError::CheckpointCorrupt(e.to_string()))
            })
            .collect::<DomainResult<_>>()?;

        if results.len() != checkpoint.position + 1 {
            return Err(DomainError::CheckpointCorrupt(format!(
                "checkpoint at position {} carries {} results",
                checkpoint.position,
                results.len()
            )));
        }

        info!(
            batch_id,
            resumed_at = checkpoint.position + 1,
            "resuming batch from checkpoint"
        );
        self.run(batch_id, items, checkpoint.position + 1, results, &mut f)
            .await
    }

    async fn run<I, R, F, Fut>(
        &self,
        batch_id: &str,
        items: &[I],
        start: usize,
        mut results: Vec<R>,
        f: &mut F,
    ) -> DomainResult<Vec<R>>
    where
        R: Serialize + DeserializeOwned,
        F: FnMut(&I) -> Fut,
        Fut: Future<Output = DomainResult<R>>,
    {
        for (index, item) in items.iter().enumerate().skip(start) {
            let result = f(item).await?;
            results.push(result);

            if (index + 1) % self.every == 0 && index + 1 < items.len() {
                let partial = results
                    .iter()
                    .map(serde_json::to_value)
                    .collect::<Result<Vec<_>, _>>()?;
                self.repo
                    .save(&Checkpoint::new(batch_id, index, partial))
                    .await?;
                debug!(batch_id, position = index, "checkpoint saved");
            }
        }

        self.repo.clear(batch_id).await?;
        Ok(results)
    }
}
