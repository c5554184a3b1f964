//! Domain errors for the Cadence scheduling and convergence core.

use thiserror::Error;
use uuid::Uuid;

/// Format a cycle path as a human-readable string: `A -> B -> C -> A`.
fn format_cycle_path(path: &[Uuid]) -> String {
    let mut parts: Vec<String> = path.iter().map(Uuid::to_string).collect();
    if let Some(first) = path.first() {
        parts.push(first.to_string());
    }
    parts.join(" -> ")
}

/// Domain-level errors that can occur in the Cadence core.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Task dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<Uuid>),

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: Uuid, dependency: Uuid },

    #[error("Duplicate task id: {0}")]
    DuplicateTask(Uuid),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("No eligible methodology remains for the current pass")]
    NoEligibleMethodology,

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Checkpoint corrupt: {0}")]
    CheckpointCorrupt(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convenience result alias used throughout the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
