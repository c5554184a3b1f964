//! Execution graph models: topological levels and conflict groups.
//!
//! A validated task set is leveled into an [`ExecutionPlan`]. Levels act as
//! barriers; within a level the conflict partitioner splits tasks into
//! independent singletons and resource-sharing groups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Task;

/// One stage of the topological leveling. Tasks in a level have no
/// dependency edges among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Zero-based position in the plan.
    pub index: usize,
    /// Task ids in this level, sorted for determinism.
    pub tasks: Vec<Uuid>,
}

impl Level {
    pub fn new(index: usize, mut tasks: Vec<Uuid>) -> Self {
        tasks.sort();
        Self { index, tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// A maximal set of tasks within a level that pairwise (transitively) share
/// touched resources. Members execute strictly sequentially in id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictGroup {
    /// Member task ids, sorted; execution follows this order.
    pub tasks: Vec<Uuid>,
}

impl ConflictGroup {
    pub fn new(mut tasks: Vec<Uuid>) -> Self {
        tasks.sort();
        Self { tasks }
    }
}

/// Partition of one level into independent tasks and conflict groups.
/// Groups and independents all run concurrently with respect to each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelPartition {
    /// Tasks with no resource conflicts inside the level, sorted.
    pub independent: Vec<Uuid>,
    /// Conflict groups, ordered by their first member.
    pub groups: Vec<ConflictGroup>,
}

impl LevelPartition {
    /// Total number of tasks across independents and groups.
    pub fn task_count(&self) -> usize {
        self.independent.len() + self.groups.iter().map(|g| g.tasks.len()).sum::<usize>()
    }
}

/// A validated, leveled task set ready for scheduling.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Levels in execution order.
    pub levels: Vec<Level>,
    /// Task bodies, keyed by id.
    pub tasks: HashMap<Uuid, Task>,
}

impl ExecutionPlan {
    /// Total number of tasks in the plan.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Look up a task body.
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }
}
