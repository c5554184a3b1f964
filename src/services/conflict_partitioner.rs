//! Conflict partitioner: splits a level into independent tasks and
//! resource-conflict groups.
//!
//! Two tasks conflict when their `touches` sets intersect. Connected
//! components of the conflict graph with more than one member become
//! [`ConflictGroup`]s and execute member-sequentially; singletons run
//! independently.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ConflictGroup, Level, LevelPartition, Task};

/// Service computing the conflict partition of one level.
#[derive(Debug, Clone, Default)]
pub struct ConflictPartitioner;

impl ConflictPartitioner {
    pub fn new() -> Self {
        Self
    }

    /// Partition a level into independents and conflict groups.
    ///
    /// The output is deterministic: independents are sorted, group members
    /// are sorted, and groups are ordered by their first member.
    pub fn partition(
        &self,
        level: &Level,
        tasks: &HashMap<Uuid, Task>,
    ) -> DomainResult<LevelPartition> {
        // Union-find over the level's tasks, joined through shared resources.
        let mut parent: HashMap<Uuid, Uuid> = level.tasks.iter().map(|&t| (t, t)).collect();

        fn find(parent: &mut HashMap<Uuid, Uuid>, id: Uuid) -> Uuid {
            let mut root = id;
            while parent[&root] != root {
                root = parent[&root];
            }
            // Path compression.
            let mut cursor = id;
            while parent[&cursor] != root {
                let next = parent[&cursor];
                parent.insert(cursor, root);
                cursor = next;
            }
            root
        }

        let mut resource_owner: HashMap<&str, Uuid> = HashMap::new();
        for &task_id in &level.tasks {
            let task = tasks
                .get(&task_id)
                .ok_or(DomainError::TaskNotFound(task_id))?;
            for resource in &task.touches {
                if let Some(&owner) = resource_owner.get(resource.as_str()) {
                    let a = find(&mut parent, owner);
                    let b = find(&mut parent, task_id);
                    if a != b {
                        parent.insert(b, a);
                    }
                } else {
                    resource_owner.insert(resource.as_str(), task_id);
                }
            }
        }

        let mut components: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for &task_id in &level.tasks {
            let root = find(&mut parent, task_id);
            components.entry(root).or_default().push(task_id);
        }

        let mut independent = Vec::new();
        let mut groups = Vec::new();
        for (_, members) in components {
            if members.len() == 1 {
                independent.push(members[0]);
            } else {
                groups.push(ConflictGroup::new(members));
            }
        }
        independent.sort();
        groups.sort_by_key(|g| g.tasks[0]);

        Ok(LevelPartition {
            independent,
            groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_touching(resources: &[&str]) -> Task {
        let mut task = Task::new("test", json!(null));
        for r in resources {
            task = task.with_resource(*r);
        }
        task
    }

    fn level_of(tasks: &[&Task]) -> (Level, HashMap<Uuid, Task>) {
        let level = Level::new(0, tasks.iter().map(|t| t.id).collect());
        let map = tasks.iter().map(|t| (t.id, (*t).clone())).collect();
        (level, map)
    }

    #[test]
    fn disjoint_resources_stay_independent() {
        let a = task_touching(&["f1"]);
        let b = task_touching(&["f2"]);
        let (level, map) = level_of(&[&a, &b]);

        let partition = ConflictPartitioner::new().partition(&level, &map).unwrap();
        assert_eq!(partition.independent.len(), 2);
        assert!(partition.groups.is_empty());
    }

    #[test]
    fn shared_resource_forms_one_group() {
        let a = task_touching(&["f1"]);
        let b = task_touching(&["f1"]);
        let (level, map) = level_of(&[&a, &b]);

        let partition = ConflictPartitioner::new().partition(&level, &map).unwrap();
        assert!(partition.independent.is_empty());
        assert_eq!(partition.groups.len(), 1);

        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(partition.groups[0].tasks, expected);
    }

    #[test]
    fn conflicts_are_transitive_through_shared_resources() {
        // a-b share f1, b-c share f2: all three serialize together.
        let a = task_touching(&["f1"]);
        let b = task_touching(&["f1", "f2"]);
        let c = task_touching(&["f2"]);
        let d = task_touching(&["f3"]);
        let (level, map) = level_of(&[&a, &b, &c, &d]);

        let partition = ConflictPartitioner::new().partition(&level, &map).unwrap();
        assert_eq!(partition.independent, vec![d.id]);
        assert_eq!(partition.groups.len(), 1);
        assert_eq!(partition.groups[0].tasks.len(), 3);
    }

    #[test]
    fn tasks_without_resources_are_independent() {
        let a = task_touching(&[]);
        let b = task_touching(&[]);
        let (level, map) = level_of(&[&a, &b]);

        let partition = ConflictPartitioner::new().partition(&level, &map).unwrap();
        assert_eq!(partition.independent.len(), 2);
    }

    #[test]
    fn partition_covers_the_whole_level() {
        let a = task_touching(&["f1"]);
        let b = task_touching(&["f1"]);
        let c = task_touching(&["f2"]);
        let (level, map) = level_of(&[&a, &b, &c]);

        let partition = ConflictPartitioner::new().partition(&level, &map).unwrap();
        assert_eq!(partition.task_count(), level.len());
    }

    #[test]
    fn missing_task_body_is_an_error() {
        let a = task_touching(&["f1"]);
        let level = Level::new(0, vec![a.id]);
        let empty = HashMap::new();

        assert!(matches!(
            ConflictPartitioner::new().partition(&level, &empty),
            Err(DomainError::TaskNotFound(_))
        ));
    }
}
