use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use serde_json::json;
use uuid::Uuid;

use cadence::domain::models::ExecutionPlan;
use cadence::services::ConflictPartitioner;
use cadence::{DomainError, GraphBuilder, Task};

/// Generated task recipes: dependencies refer to earlier indices, so the
/// graph is a DAG by construction. Resources come from a small pool to force
/// conflicts.
fn dag_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(
        (
            prop::collection::vec(any::<prop::sample::Index>(), 0..4),
            prop::collection::vec(0usize..4, 0..3),
        ),
        1..25,
    )
    .prop_map(|recipes| {
        let mut tasks: Vec<Task> = Vec::with_capacity(recipes.len());
        for (i, (dep_picks, resources)) in recipes.into_iter().enumerate() {
            let mut task = Task::new(format!("t{i}"), json!(null));
            if i > 0 {
                let deps: HashSet<Uuid> = dep_picks
                    .into_iter()
                    .map(|pick| tasks[pick.index(i)].id)
                    .collect();
                task = task.with_dependencies(deps);
            }
            for r in resources {
                task = task.with_resource(format!("res-{r}"));
            }
            tasks.push(task);
        }
        tasks
    })
}

fn level_index_of(plan: &ExecutionPlan) -> HashMap<Uuid, usize> {
    plan.levels
        .iter()
        .flat_map(|level| level.tasks.iter().map(move |&id| (id, level.index)))
        .collect()
}

proptest! {
    #[test]
    fn every_dependency_lands_in_a_strictly_earlier_level(tasks in dag_tasks()) {
        let plan = GraphBuilder::new().build(tasks).expect("DAG should build");
        let level_of = level_index_of(&plan);

        for task in plan.tasks.values() {
            for dep in &task.depends_on {
                prop_assert!(level_of[dep] < level_of[&task.id]);
            }
        }
    }

    #[test]
    fn levels_partition_the_task_set(tasks in dag_tasks()) {
        let expected: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
        let plan = GraphBuilder::new().build(tasks).expect("DAG should build");

        let mut seen = HashSet::new();
        for level in &plan.levels {
            for &id in &level.tasks {
                prop_assert!(seen.insert(id), "task appears in two levels");
            }
        }
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn conflict_partition_covers_each_level_exactly(tasks in dag_tasks()) {
        let plan = GraphBuilder::new().build(tasks).expect("DAG should build");
        let partitioner = ConflictPartitioner::new();

        for level in &plan.levels {
            let partition = partitioner
                .partition(level, &plan.tasks)
                .expect("partition should succeed");

            let mut seen: HashSet<Uuid> = partition.independent.iter().copied().collect();
            prop_assert_eq!(seen.len(), partition.independent.len());
            for group in &partition.groups {
                prop_assert!(group.tasks.len() >= 2, "groups have at least two members");
                for &id in &group.tasks {
                    prop_assert!(seen.insert(id), "task in two partitions");
                }
            }

            let level_set: HashSet<Uuid> = level.tasks.iter().copied().collect();
            prop_assert_eq!(seen, level_set);
        }
    }

    #[test]
    fn group_members_pairwise_or_transitively_share_resources(tasks in dag_tasks()) {
        let plan = GraphBuilder::new().build(tasks).expect("DAG should build");
        let partitioner = ConflictPartitioner::new();

        for level in &plan.levels {
            let partition = partitioner
                .partition(level, &plan.tasks)
                .expect("partition should succeed");

            // Independent tasks conflict with nothing else in their level.
            for &id in &partition.independent {
                let task = &plan.tasks[&id];
                for &other_id in &level.tasks {
                    if other_id != id {
                        prop_assert!(!task.conflicts_with(&plan.tasks[&other_id]));
                    }
                }
            }
        }
    }

    #[test]
    fn any_cycle_is_rejected(len in 2usize..8, extra in dag_tasks()) {
        // A ring of `len` tasks, mixed into an otherwise valid DAG.
        let mut ring: Vec<Task> = (0..len)
            .map(|i| Task::new(format!("ring-{i}"), json!(null)))
            .collect();
        let ids: Vec<Uuid> = ring.iter().map(|t| t.id).collect();
        for (i, task) in ring.iter_mut().enumerate() {
            task.depends_on.insert(ids[(i + 1) % len]);
        }

        let mut tasks = extra;
        tasks.extend(ring);

        let err = GraphBuilder::new().build(tasks).expect_err("cycle must be fatal");
        match err {
            DomainError::DependencyCycle(members) => {
                prop_assert!(!members.is_empty());
                prop_assert!(members.iter().all(|id| ids.contains(id)));
            }
            other => prop_assert!(false, "expected a cycle error, got {other:?}"),
        }
    }
}
