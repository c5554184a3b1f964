//! Graph builder: validates task dependencies, detects cycles, and levels
//! the DAG for barrier execution.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ExecutionPlan, Level, Task};

/// Service for turning a task set into an ordered list of levels.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder;

// Standalone helper for cycle detection (no self needed).
fn detect_cycle_util(
    node: Uuid,
    graph: &HashMap<Uuid, Vec<Uuid>>,
    visited: &mut HashSet<Uuid>,
    rec_stack: &mut HashSet<Uuid>,
    path: &mut Vec<Uuid>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(&node) {
        for &neighbor in neighbors {
            if !visited.contains(&neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(&neighbor) {
                // Trim the prefix so the path contains only cycle members.
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(&node);
    path.pop();
    false
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Validate that ids are unique and every dependency is in the set.
    pub fn validate(&self, tasks: &[Task]) -> DomainResult<()> {
        let mut ids: HashSet<Uuid> = HashSet::with_capacity(tasks.len());
        for task in tasks {
            if !ids.insert(task.id) {
                return Err(DomainError::DuplicateTask(task.id));
            }
        }
        for task in tasks {
            for &dep in &task.depends_on {
                if !ids.contains(&dep) {
                    return Err(DomainError::UnknownDependency {
                        task: task.id,
                        dependency: dep,
                    });
                }
            }
        }
        Ok(())
    }

    /// Detect a circular dependency, returning the members of one cycle.
    pub fn detect_cycle(&self, tasks: &[Task]) -> Option<Vec<Uuid>> {
        let mut graph: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for task in tasks {
            graph
                .entry(task.id)
                .or_default()
                .extend(task.depends_on.iter().copied());
        }

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        let mut roots: Vec<Uuid> = graph.keys().copied().collect();
        roots.sort();
        for task_id in roots {
            if !visited.contains(&task_id)
                && detect_cycle_util(task_id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path);
            }
        }

        None
    }

    /// Validate the task set and compute its topological levels.
    ///
    /// A task's level is one greater than the maximum level of its
    /// dependencies, or 0 if it has none. Any cycle is fatal and aborts the
    /// whole run before anything executes.
    pub fn build(&self, tasks: Vec<Task>) -> DomainResult<ExecutionPlan> {
        self.validate(&tasks)?;
        if let Some(cycle) = self.detect_cycle(&tasks) {
            return Err(DomainError::DependencyCycle(cycle));
        }

        let deps: HashMap<Uuid, Vec<Uuid>> = tasks
            .iter()
            .map(|t| (t.id, t.depends_on.iter().copied().collect()))
            .collect();

        // Iterative fixed-point: safe because the graph is now known acyclic.
        let mut level_of: HashMap<Uuid, usize> = HashMap::with_capacity(tasks.len());
        let mut pending: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        while !pending.is_empty() {
            let mut next_pending = Vec::new();
            for id in pending {
                let dep_ids = &deps[&id];
                if dep_ids.iter().all(|d| level_of.contains_key(d)) {
                    let level = dep_ids
                        .iter()
                        .map(|d| level_of[d] + 1)
                        .max()
                        .unwrap_or(0);
                    level_of.insert(id, level);
                } else {
                    next_pending.push(id);
                }
            }
            pending = next_pending;
        }

        let mut buckets: HashMap<usize, Vec<Uuid>> = HashMap::new();
        for (id, level) in &level_of {
            buckets.entry(*level).or_default().push(*id);
        }

        let level_count = buckets.keys().max().map_or(0, |max| max + 1);
        let levels: Vec<Level> = (0..level_count)
            .map(|index| Level::new(index, buckets.remove(&index).unwrap_or_default()))
            .collect();

        Ok(ExecutionPlan {
            levels,
            tasks: tasks.into_iter().map(|t| (t.id, t)).collect(),
        })
    }
}
