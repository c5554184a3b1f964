//! In-memory checkpoint repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::Checkpoint;
use crate::domain::ports::CheckpointRepository;

/// Keeps one checkpoint per batch id in process memory. Suitable for tests
/// and for callers that only need resumability within a process lifetime.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointRepository {
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointRepository for InMemoryCheckpointRepository {
    async fn save(&self, checkpoint: &Checkpoint) -> DomainResult<()> {
        self.checkpoints
            .write()
            .await
            .insert(checkpoint.batch_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, batch_id: &str) -> DomainResult<Option<Checkpoint>> {
        Ok(self.checkpoints.read().await.get(batch_id).cloned())
    }

    async fn clear(&self, batch_id: &str) -> DomainResult<()> {
        self.checkpoints.write().await.remove(batch_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_load_clear_round_trip() {
        let repo = InMemoryCheckpointRepository::new();
        let cp = Checkpoint::new("batch", 4, vec![json!(1)]);

        repo.save(&cp).await.unwrap();
        assert_eq!(repo.load("batch").await.unwrap(), Some(cp));

        repo.clear("batch").await.unwrap();
        assert!(repo.load("batch").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_checkpoint() {
        let repo = InMemoryCheckpointRepository::new();
        repo.save(&Checkpoint::new("batch", 2, vec![])).await.unwrap();
        repo.save(&Checkpoint::new("batch", 7, vec![])).await.unwrap();

        let loaded = repo.load("batch").await.unwrap().unwrap();
        assert_eq!(loaded.position, 7);
    }
}
