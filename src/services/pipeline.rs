//! Pipeline: the full schedule-review-fix loop as one operation.
//!
//! Submitted tasks are scheduled first. Review passes then run until the
//! session converges or hits the pass cap; every dirty pass yields fix tasks
//! that are scheduled through the same executor before the next pass.

use std::sync::Arc;

use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Config, ConvergenceSession, Deliverable, SessionStatus, Task};
use crate::domain::ports::{PatternRepository, TaskExecutor};
use crate::services::convergence_controller::{ConvergenceController, PassOutcome};
use crate::services::graph_builder::GraphBuilder;
use crate::services::retry::RetryPolicy;
use crate::services::scheduler::{RunResults, Scheduler};

/// Plain-data outcome of a pipeline run, for an external reporter.
#[derive(Debug)]
pub struct PipelineReport {
    /// Results of every scheduling run: the submitted batch first, then one
    /// entry per dirty pass that produced fix tasks.
    pub scheduling_runs: Vec<RunResults>,
    /// Terminal convergence session.
    pub session: ConvergenceSession,
}

impl PipelineReport {
    /// Whether the deliverables converged.
    pub fn converged(&self) -> bool {
        self.session.status == SessionStatus::Converged
    }
}

/// Composes the graph builder, scheduler and convergence controller.
pub struct Pipeline<P: PatternRepository> {
    graph: GraphBuilder,
    scheduler: Scheduler,
    controller: ConvergenceController<P>,
}

impl<P: PatternRepository> Pipeline<P> {
    pub fn new(config: &Config, controller: ConvergenceController<P>) -> Self {
        Self {
            graph: GraphBuilder::new(),
            scheduler: Scheduler::new(
                config.scheduler.clone(),
                RetryPolicy::from_config(&config.retry),
            ),
            controller,
        }
    }

    /// Run the loop to completion.
    ///
    /// Executing a fix task is expected to change what the methodologies
    /// observe; the executor and the methodologies share that state behind
    /// their ports, the pipeline only sequences them.
    pub async fn run(
        &self,
        tasks: Vec<Task>,
        executor: Arc<dyn TaskExecutor>,
        deliverables: &[Deliverable],
    ) -> DomainResult<PipelineReport> {
        let mut scheduling_runs = Vec::new();
        if !tasks.is_empty() {
            scheduling_runs.push(self.schedule(tasks, executor.clone()).await?);
        }

        let mut session = self.controller.new_session();
        info!(session_id = %session.id, "starting review loop");

        while session.status == SessionStatus::Running {
            match self.controller.run_pass(&mut session, deliverables).await {
                Ok(PassOutcome::Clean { .. }) => {}
                Ok(PassOutcome::Dirty { fix_tasks, .. }) => {
                    if session.status == SessionStatus::Running && !fix_tasks.is_empty() {
                        scheduling_runs.push(self.schedule(fix_tasks, executor.clone()).await?);
                    }
                }
                Err(DomainError::NoEligibleMethodology) => {
                    session.status = SessionStatus::FailedMaxIterations;
                }
                Err(err) => return Err(err),
            }
        }

        self.controller.finalize(&session).await?;
        Ok(PipelineReport {
            scheduling_runs,
            session,
        })
    }

    async fn schedule(
        &self,
        tasks: Vec<Task>,
        executor: Arc<dyn TaskExecutor>,
    ) -> DomainResult<RunResults> {
        let plan = self.graph.build(tasks)?;
        self.scheduler.run(&plan, executor).await
    }
}
