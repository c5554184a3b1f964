//! Parallel scheduler: level-barrier execution with bounded concurrency and
//! conflict-group serialization.
//!
//! Levels run strictly in order; a level starts only after every task of the
//! previous level has a recorded result. Within a level, independent tasks
//! and conflict groups all launch concurrently under a semaphore cap, while
//! members of one conflict group run strictly sequentially.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ExecutionPlan, ExecutionResult, SchedulerConfig, Task, TaskError,
};
use crate::domain::ports::TaskExecutor;
use crate::services::conflict_partitioner::ConflictPartitioner;
use crate::services::retry::RetryPolicy;

/// Overall status of a scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every task succeeded.
    Completed,
    /// Some tasks succeeded, some failed or were skipped.
    PartialSuccess,
    /// No task succeeded.
    Failed,
}

/// Event emitted during a scheduling run.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// Run started.
    Started { total_tasks: usize, level_count: usize },
    /// Level started.
    LevelStarted { level: usize, task_count: usize },
    /// Task began its first attempt.
    TaskStarted { task_id: Uuid },
    /// Task attempt failed and another attempt is starting.
    TaskRetrying { task_id: Uuid, attempt: u32 },
    /// Task reached a successful terminal result.
    TaskCompleted { task_id: Uuid, attempts: u32 },
    /// Task reached a failed terminal result.
    TaskFailed { task_id: Uuid, error: String, attempts: u32 },
    /// Task was never executed (upstream failure or group abort).
    TaskSkipped { task_id: Uuid, reason: String },
    /// Level finished.
    LevelCompleted { level: usize, succeeded: usize, failed: usize, skipped: usize },
    /// Run finished.
    Completed { status: RunStatus },
}

/// Results of a scheduling run: exactly one terminal result per task.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    pub total_tasks: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    /// Terminal results keyed by task id.
    pub results: HashMap<Uuid, ExecutionResult>,
}

impl RunResults {
    /// Overall run status.
    pub fn status(&self) -> RunStatus {
        if self.failed == 0 && self.skipped == 0 {
            RunStatus::Completed
        } else if self.succeeded > 0 {
            RunStatus::PartialSuccess
        } else {
            RunStatus::Failed
        }
    }

    /// Fraction of tasks that succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.total_tasks as f64
    }

    /// The terminal result for one task.
    pub fn result(&self, task_id: Uuid) -> Option<&ExecutionResult> {
        self.results.get(&task_id)
    }

    fn absorb(&mut self, result: ExecutionResult) {
        if result.is_success() {
            self.succeeded += 1;
        } else if result.was_skipped() {
            self.skipped += 1;
        } else {
            self.failed += 1;
        }
        self.results.insert(result.task_id, result);
    }
}

/// Scheduler for running execution plans.
pub struct Scheduler {
    config: SchedulerConfig,
    retry: RetryPolicy,
    partitioner: ConflictPartitioner,
}

/// A launchable unit within a level: one independent task or one conflict
/// group whose members run sequentially.
struct Unit {
    tasks: Vec<Task>,
    is_group: bool,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, retry: RetryPolicy) -> Self {
        Self {
            config,
            retry,
            partitioner: ConflictPartitioner::new(),
        }
    }

    /// Run a plan, discarding events.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        executor: Arc<dyn TaskExecutor>,
    ) -> DomainResult<RunResults> {
        let (tx, _rx) = mpsc::channel(100);
        self.run_with_events(plan, executor, tx).await
    }

    /// Run a plan with event streaming.
    ///
    /// A task never begins before all its dependencies have a recorded
    /// result; a failed task does not abort its level siblings, but its
    /// dependents are skipped with an upstream-failure error instead of
    /// being executed.
    pub async fn run_with_events(
        &self,
        plan: &ExecutionPlan,
        executor: Arc<dyn TaskExecutor>,
        event_tx: mpsc::Sender<SchedulerEvent>,
    ) -> DomainResult<RunResults> {
        let start = Instant::now();
        let mut run = RunResults {
            total_tasks: plan.task_count(),
            ..RunResults::default()
        };

        let _ = event_tx
            .send(SchedulerEvent::Started {
                total_tasks: plan.task_count(),
                level_count: plan.levels.len(),
            })
            .await;

        // Ids of tasks with a Failed terminal result, across levels.
        let mut failed: HashSet<Uuid> = HashSet::new();

        for (level_idx, level) in plan.levels.iter().enumerate() {
            if let (true, Some(&blocker)) = (self.config.fail_fast, failed.iter().next()) {
                // Remaining tasks get terminal skip results instead of
                // silently vanishing.
                for &task_id in plan.levels[level_idx..].iter().flat_map(|l| &l.tasks) {
                    let result = ExecutionResult::skipped(task_id, blocker);
                    let _ = event_tx
                        .send(SchedulerEvent::TaskSkipped {
                            task_id,
                            reason: "fail-fast abort".to_string(),
                        })
                        .await;
                    run.absorb(result);
                }
                break;
            }

            let _ = event_tx
                .send(SchedulerEvent::LevelStarted {
                    level: level_idx,
                    task_count: level.len(),
                })
                .await;

            let partition = self.partitioner.partition(level, &plan.tasks)?;

            let mut units: Vec<Unit> = Vec::new();
            for &task_id in &partition.independent {
                units.push(Unit {
                    tasks: vec![self.task_body(plan, task_id)?],
                    is_group: false,
                });
            }
            for group in &partition.groups {
                let tasks = group
                    .tasks
                    .iter()
                    .map(|&id| self.task_body(plan, id))
                    .collect::<DomainResult<Vec<_>>>()?;
                units.push(Unit {
                    tasks,
                    is_group: true,
                });
            }

            let level_results = self
                .execute_level(units, &failed, executor.clone(), &event_tx)
                .await?;

            let (mut level_ok, mut level_failed, mut level_skipped) = (0, 0, 0);
            for result in level_results {
                if result.is_success() {
                    level_ok += 1;
                } else {
                    if result.was_skipped() {
                        level_skipped += 1;
                    } else {
                        level_failed += 1;
                    }
                    failed.insert(result.task_id);
                }
                run.absorb(result);
            }

            let _ = event_tx
                .send(SchedulerEvent::LevelCompleted {
                    level: level_idx,
                    succeeded: level_ok,
                    failed: level_failed,
                    skipped: level_skipped,
                })
                .await;
        }

        run.duration_ms = start.elapsed().as_millis() as u64;
        let _ = event_tx
            .send(SchedulerEvent::Completed { status: run.status() })
            .await;

        Ok(run)
    }

    fn task_body(&self, plan: &ExecutionPlan, task_id: Uuid) -> DomainResult<Task> {
        plan.task(task_id)
            .cloned()
            .ok_or(DomainError::TaskNotFound(task_id))
    }

    /// Launch a level's units concurrently under the semaphore cap and
    /// collect every terminal result.
    async fn execute_level(
        &self,
        units: Vec<Unit>,
        failed_upstream: &HashSet<Uuid>,
        executor: Arc<dyn TaskExecutor>,
        event_tx: &mpsc::Sender<SchedulerEvent>,
    ) -> DomainResult<Vec<ExecutionResult>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut handles = Vec::new();

        for unit in units {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ExecutionFailed("semaphore closed".to_string()))?;

            let retry = self.retry.clone();
            let executor = executor.clone();
            let event_tx = event_tx.clone();
            let failed_upstream = failed_upstream.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                execute_unit(unit, &failed_upstream, retry, executor, event_tx).await
            });
            handles.push(handle);
        }

        let mut results = Vec::new();
        for joined in futures::future::join_all(handles).await {
            let unit_results =
                joined.map_err(|e| DomainError::ExecutionFailed(format!("join error: {e}")))?;
            results.extend(unit_results);
        }
        Ok(results)
    }
}

/// Execute one unit. Group members run in id order; a member failure aborts
/// the rest of the group.
async fn execute_unit(
    unit: Unit,
    failed_upstream: &HashSet<Uuid>,
    retry: RetryPolicy,
    executor: Arc<dyn TaskExecutor>,
    event_tx: mpsc::Sender<SchedulerEvent>,
) -> Vec<ExecutionResult> {
    let mut results = Vec::with_capacity(unit.tasks.len());
    let mut group_failure: Option<Uuid> = None;

    for task in unit.tasks {
        if let Some(failed_member) = group_failure {
            let _ = event_tx
                .send(SchedulerEvent::TaskSkipped {
                    task_id: task.id,
                    reason: format!("conflict group aborted by {failed_member}"),
                })
                .await;
            results.push(ExecutionResult::group_aborted(task.id, failed_member));
            continue;
        }

        if let Some(&blocker) = task.depends_on.intersection(failed_upstream).next() {
            let _ = event_tx
                .send(SchedulerEvent::TaskSkipped {
                    task_id: task.id,
                    reason: format!("dependency {blocker} failed"),
                })
                .await;
            results.push(ExecutionResult::skipped(task.id, blocker));
            continue;
        }

        let _ = event_tx
            .send(SchedulerEvent::TaskStarted { task_id: task.id })
            .await;

        let started = Instant::now();
        let mut call_count = 0u32;
        let attempted = retry
            .execute(|| {
                call_count += 1;
                let attempt = call_count;
                let executor = executor.clone();
                let event_tx = event_tx.clone();
                let task = &task;
                async move {
                    if attempt > 1 {
                        let _ = event_tx
                            .send(SchedulerEvent::TaskRetrying {
                                task_id: task.id,
                                attempt,
                            })
                            .await;
                    }
                    executor.execute(task).await
                }
            })
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match attempted.outcome {
            Ok(output) => {
                let _ = event_tx
                    .send(SchedulerEvent::TaskCompleted {
                        task_id: task.id,
                        attempts: attempted.attempts,
                    })
                    .await;
                results.push(ExecutionResult::succeeded(
                    task.id,
                    attempted.attempts,
                    output,
                    duration_ms,
                ));
            }
            Err(err) => {
                let message = err.to_string();
                let _ = event_tx
                    .send(SchedulerEvent::TaskFailed {
                        task_id: task.id,
                        error: message.clone(),
                        attempts: attempted.attempts,
                    })
                    .await;
                results.push(ExecutionResult::failed(
                    task.id,
                    attempted.attempts,
                    TaskError::Execution { message },
                    duration_ms,
                ));
                if unit.is_group {
                    group_failure = Some(task.id);
                }
            }
        }
    }

    results
}
