//! Convergence controller: drives review passes until a clean-streak target
//! is reached.
//!
//! Each pass runs one methodology (never repeated within the current clean
//! streak) against the deliverable set. Clean passes build the streak; a
//! dirty pass resets it, synthesizes fix tasks for the caller to schedule,
//! and records every issue as a candidate antipattern. The session ends
//! `Converged` or, at the pass cap, `FailedMaxIterations`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ConvergenceConfig, ConvergenceSession, Deliverable, Issue, SessionStatus, Task, TaskSource,
};
use crate::domain::ports::{Methodology, PatternRepository};
use crate::services::methodology_selector::MethodologySelector;
use crate::services::pattern_service::PatternService;

/// Event emitted during a convergence session.
#[derive(Debug, Clone)]
pub enum ConvergenceEvent {
    /// Session started.
    SessionStarted { session_id: Uuid, methodologies: Vec<String> },
    /// A pass began.
    PassStarted { pass: u32, methodology: String },
    /// A pass reported no issues.
    PassClean { pass: u32, methodology: String, consecutive_clean: u32 },
    /// A pass reported issues.
    PassDirty { pass: u32, methodology: String, issue_count: usize },
    /// The clean-streak target was reached.
    Converged { session_id: Uuid, total_passes: u32 },
    /// The pass cap was reached without convergence.
    MaxIterationsReached { session_id: Uuid, total_passes: u32 },
}

/// Outcome of a single pass.
#[derive(Debug)]
pub enum PassOutcome {
    /// No issues; the streak grew.
    Clean { consecutive_clean: u32 },
    /// Issues found; fix tasks are returned for the caller to schedule.
    Dirty { issues: Vec<Issue>, fix_tasks: Vec<Task> },
}

/// Final report of a convergence session, as plain data for an external
/// reporter to render.
#[derive(Debug)]
pub struct SessionReport {
    /// Terminal session state (status, pass log, counters).
    pub session: ConvergenceSession,
    /// Every fix task synthesized across dirty passes.
    pub fix_tasks: Vec<Task>,
}

/// Controller owning the pass loop for one deliverable set.
pub struct ConvergenceController<P: PatternRepository> {
    methodologies: HashMap<String, Arc<dyn Methodology>>,
    names: Vec<String>,
    selector: MethodologySelector,
    patterns: PatternService<P>,
    config: ConvergenceConfig,
    event_tx: Option<mpsc::Sender<ConvergenceEvent>>,
}

impl<P: PatternRepository> ConvergenceController<P> {
    /// Create a controller over the given methodologies.
    ///
    /// Methodology names must be distinct. The available set should be at
    /// least as large as the clean-streak target; a smaller set cannot
    /// converge under the per-streak no-reuse rule.
    pub fn new(
        methodologies: Vec<Arc<dyn Methodology>>,
        patterns: PatternService<P>,
        config: ConvergenceConfig,
    ) -> DomainResult<Self> {
        if methodologies.is_empty() {
            return Err(DomainError::ValidationFailed(
                "at least one methodology is required".to_string(),
            ));
        }

        let mut map = HashMap::new();
        let mut names = Vec::new();
        for methodology in methodologies {
            let name = methodology.name().to_string();
            if map.insert(name.clone(), methodology).is_some() {
                return Err(DomainError::ValidationFailed(format!(
                    "duplicate methodology name: {name}"
                )));
            }
            names.push(name);
        }

        if (names.len() as u32) < config.target_clean_passes {
            warn!(
                available = names.len(),
                target = config.target_clean_passes,
                "fewer methodologies than the clean-streak target; convergence is unreachable"
            );
        }

        Ok(Self {
            methodologies: map,
            names,
            selector: MethodologySelector::new(),
            patterns,
            config,
            event_tx: None,
        })
    }

    /// Replace the selector (e.g. with a seeded one in tests).
    #[must_use]
    pub fn with_selector(mut self, selector: MethodologySelector) -> Self {
        self.selector = selector;
        self
    }

    /// Stream convergence events to the given channel.
    #[must_use]
    pub fn with_events(mut self, event_tx: mpsc::Sender<ConvergenceEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Start a fresh session over this controller's methodologies.
    pub fn new_session(&self) -> ConvergenceSession {
        ConvergenceSession::new(self.names.clone())
    }

    async fn emit(&self, event: ConvergenceEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }

    /// Run one pass of an active session.
    ///
    /// Dirty passes return synthesized fix tasks; scheduling them is the
    /// caller's responsibility (see `Pipeline` for the full loop).
    pub async fn run_pass(
        &self,
        session: &mut ConvergenceSession,
        deliverables: &[Deliverable],
    ) -> DomainResult<PassOutcome> {
        if session.status.is_terminal() {
            return Err(DomainError::ValidationFailed(
                "convergence session already reached a terminal status".to_string(),
            ));
        }

        let name = self.selector.next(session, self.config.reuse_scope)?;
        let methodology = self
            .methodologies
            .get(&name)
            .ok_or_else(|| DomainError::ValidationFailed(format!("unknown methodology: {name}")))?;

        session.total_passes += 1;
        let pass = session.total_passes;
        self.emit(ConvergenceEvent::PassStarted {
            pass,
            methodology: name.clone(),
        })
        .await;

        let issues = methodology.review(deliverables).await?;

        if issues.is_empty() {
            session.record_clean(&name);
            self.emit(ConvergenceEvent::PassClean {
                pass,
                methodology: name.clone(),
                consecutive_clean: session.consecutive_clean,
            })
            .await;

            if session.consecutive_clean >= self.config.target_clean_passes {
                session.status = SessionStatus::Converged;
                info!(session_id = %session.id, pass, "session converged");
                self.emit(ConvergenceEvent::Converged {
                    session_id: session.id,
                    total_passes: pass,
                })
                .await;
            } else if pass >= self.config.max_passes {
                session.status = SessionStatus::FailedMaxIterations;
                self.emit(ConvergenceEvent::MaxIterationsReached {
                    session_id: session.id,
                    total_passes: pass,
                })
                .await;
            }

            return Ok(PassOutcome::Clean {
                consecutive_clean: session.consecutive_clean,
            });
        }

        let fix_tasks = self.synthesize_fix_tasks(&issues, pass).await?;
        session.record_dirty(&name, issues.clone());
        if let Some(record) = session.issues_log.last() {
            warn!(
                pass,
                methodology = %record.methodology,
                severity_counts = ?record.severity_counts(),
                "pass reported issues, clean streak reset"
            );
        }
        self.emit(ConvergenceEvent::PassDirty {
            pass,
            methodology: name,
            issue_count: issues.len(),
        })
        .await;

        if pass >= self.config.max_passes {
            session.status = SessionStatus::FailedMaxIterations;
            self.emit(ConvergenceEvent::MaxIterationsReached {
                session_id: session.id,
                total_passes: pass,
            })
            .await;
        }

        Ok(PassOutcome::Dirty { issues, fix_tasks })
    }

    /// Run a whole session: passes repeat until the session converges or
    /// hits the pass cap, then learned patterns are finalized and flushed.
    ///
    /// Fix tasks are collected into the report; interleaving their
    /// execution with passes is the pipeline's job.
    pub async fn run_session(&self, deliverables: &[Deliverable]) -> DomainResult<SessionReport> {
        let mut session = self.new_session();
        self.emit(ConvergenceEvent::SessionStarted {
            session_id: session.id,
            methodologies: self.names.clone(),
        })
        .await;

        let mut fix_tasks = Vec::new();
        while session.status == SessionStatus::Running {
            match self.run_pass(&mut session, deliverables).await {
                Ok(PassOutcome::Dirty { fix_tasks: tasks, .. }) => fix_tasks.extend(tasks),
                Ok(PassOutcome::Clean { .. }) => {}
                Err(DomainError::NoEligibleMethodology) => {
                    // Per-session no-reuse ran out of methodologies.
                    session.status = SessionStatus::FailedMaxIterations;
                    self.emit(ConvergenceEvent::MaxIterationsReached {
                        session_id: session.id,
                        total_passes: session.total_passes,
                    })
                    .await;
                }
                Err(err) => return Err(err),
            }
        }

        self.finalize(&session).await?;
        Ok(SessionReport { session, fix_tasks })
    }

    /// Write session learnings to the pattern store and flush it.
    ///
    /// On convergence every logged issue's fix held through the final clean
    /// streak, so each is re-recorded as a successful application.
    pub async fn finalize(&self, session: &ConvergenceSession) -> DomainResult<()> {
        if session.status == SessionStatus::Converged {
            for issue in session.all_issues() {
                self.patterns.mark_resolved(issue, "").await?;
            }
        }
        self.patterns.flush().await
    }

    /// Build one fix task per issue, attaching any known fix from the
    /// pattern store. Fix tasks touch the issue's location so fixes to the
    /// same deliverable serialize when scheduled.
    async fn synthesize_fix_tasks(&self, issues: &[Issue], pass: u32) -> DomainResult<Vec<Task>> {
        let mut tasks = Vec::with_capacity(issues.len());
        for issue in issues {
            let known = self.patterns.known_fix(issue).await?;
            let proposed = known
                .as_ref()
                .map_or_else(|| format!("resolve: {}", issue.description), |p| {
                    p.prevention_or_fix.clone()
                });
            self.patterns.record_candidate(issue, &proposed).await?;

            let mut task = Task::new(
                format!("fix [{}] {}", issue.category, issue.description),
                json!({
                    "issue": issue,
                    "known_fix": known.as_ref().map(|p| p.prevention_or_fix.clone()),
                }),
            )
            .with_resource(issue.location.clone());
            task.source = TaskSource::FixFor { pass };
            tasks.push(task);
        }
        Ok(tasks)
    }
}
