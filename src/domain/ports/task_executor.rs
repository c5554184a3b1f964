//! Port for the caller-supplied task execution callback.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Task;

/// Executes a task's opaque payload.
///
/// The core never inspects the payload; it hands the whole task to the
/// executor and records the outcome. Errors are retried by the scheduler's
/// retry policy before they become terminal.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute one task attempt, returning its opaque output.
    async fn execute(&self, task: &Task) -> DomainResult<serde_json::Value>;
}
