//! Port for checkpoint persistence.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Checkpoint;

/// Stores at most one checkpoint per batch id.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Save (or replace) the checkpoint for its batch.
    async fn save(&self, checkpoint: &Checkpoint) -> DomainResult<()>;

    /// Load the checkpoint for a batch, if one exists.
    async fn load(&self, batch_id: &str) -> DomainResult<Option<Checkpoint>>;

    /// Remove the checkpoint for a batch. Called on successful completion.
    async fn clear(&self, batch_id: &str) -> DomainResult<()>;
}
