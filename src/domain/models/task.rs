//! Task domain model.
//!
//! Tasks are discrete units of work submitted by a caller or synthesized by
//! the convergence controller. They form a DAG through `depends_on` and
//! declare the resources they touch so the scheduler can serialize conflicts.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a task originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TaskSource {
    /// Task submitted directly by the caller.
    Submitted,
    /// Fix task synthesized from an issue found during a convergence pass.
    FixFor {
        /// The pass number that reported the issue.
        pass: u32,
    },
}

impl Default for TaskSource {
    fn default() -> Self {
        Self::Submitted
    }
}

/// A unit of work scheduled by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id.
    pub id: Uuid,
    /// Short human-readable summary.
    pub summary: String,
    /// Ids of tasks that must complete before this one starts.
    pub depends_on: HashSet<Uuid>,
    /// Opaque resource identifiers this task touches (e.g. file paths).
    /// Tasks sharing a resource within a level are serialized.
    pub touches: HashSet<String>,
    /// Opaque payload handed to the execution callback.
    pub payload: serde_json::Value,
    /// Origin of the task.
    #[serde(default)]
    pub source: TaskSource,
    /// When the task entered the system.
    pub submitted_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with no dependencies and no touched resources.
    pub fn new(summary: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            summary: summary.into(),
            depends_on: HashSet::new(),
            touches: HashSet::new(),
            payload,
            source: TaskSource::Submitted,
            submitted_at: Utc::now(),
        }
    }

    /// Add a dependency on another task.
    #[must_use]
    pub fn with_dependency(mut self, dep: Uuid) -> Self {
        self.depends_on.insert(dep);
        self
    }

    /// Add dependencies on several tasks.
    #[must_use]
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = Uuid>) -> Self {
        self.depends_on.extend(deps);
        self
    }

    /// Declare a touched resource.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.touches.insert(resource.into());
        self
    }

    /// Whether this task shares at least one resource with another.
    pub fn conflicts_with(&self, other: &Self) -> bool {
        !self.touches.is_disjoint(&other.touches)
    }
}

/// Terminal status of a task attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Task completed successfully.
    Succeeded,
    /// Task failed, was skipped, or was aborted with its conflict group.
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Why a task ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskError {
    /// The execution callback returned an error after all retries.
    Execution {
        /// Last error message observed.
        message: String,
    },
    /// A dependency failed, so this task was never executed.
    UpstreamFailure {
        /// The failed dependency that blocked this task.
        failed_dependency: Uuid,
    },
    /// An earlier member of the same conflict group failed, aborting the
    /// remainder of the group.
    GroupAborted {
        /// The group member whose failure aborted the group.
        failed_member: Uuid,
    },
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execution { message } => write!(f, "{message}"),
            Self::UpstreamFailure { failed_dependency } => {
                write!(f, "upstream-failure: dependency {failed_dependency} failed")
            }
            Self::GroupAborted { failed_member } => {
                write!(f, "group-aborted: member {failed_member} failed")
            }
        }
    }
}

/// Outcome of one task. Immutable once recorded; every task ends in exactly
/// one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub task_id: Uuid,
    pub status: ExecutionStatus,
    /// Present iff `status` is `Failed`.
    pub error: Option<TaskError>,
    /// Number of attempts made. Zero for tasks that never started.
    pub attempts: u32,
    /// Output produced by the execution callback, if any.
    pub output: Option<serde_json::Value>,
    /// Wall-clock duration of all attempts combined.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Record a successful attempt.
    pub fn succeeded(
        task_id: Uuid,
        attempts: u32,
        output: serde_json::Value,
        duration_ms: u64,
    ) -> Self {
        Self {
            task_id,
            status: ExecutionStatus::Succeeded,
            error: None,
            attempts,
            output: Some(output),
            duration_ms,
        }
    }

    /// Record a failure after `attempts` tries.
    pub fn failed(task_id: Uuid, attempts: u32, error: TaskError, duration_ms: u64) -> Self {
        Self {
            task_id,
            status: ExecutionStatus::Failed,
            error: Some(error),
            attempts,
            output: None,
            duration_ms,
        }
    }

    /// Record a task skipped because a dependency failed.
    pub fn skipped(task_id: Uuid, failed_dependency: Uuid) -> Self {
        Self::failed(
            task_id,
            0,
            TaskError::UpstreamFailure { failed_dependency },
            0,
        )
    }

    /// Record a task aborted with its conflict group.
    pub fn group_aborted(task_id: Uuid, failed_member: Uuid) -> Self {
        Self::failed(task_id, 0, TaskError::GroupAborted { failed_member }, 0)
    }

    /// Whether the task succeeded.
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Succeeded
    }

    /// Whether the task never actually ran (skipped or group-aborted).
    pub fn was_skipped(&self) -> bool {
        matches!(
            self.error,
            Some(TaskError::UpstreamFailure { .. } | TaskError::GroupAborted { .. })
        )
    }
}
