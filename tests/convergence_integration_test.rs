use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use cadence::adapters::memory::InMemoryPatternRepository;
use cadence::domain::models::{ConvergenceConfig, Deliverable, MethodologyReuse};
use cadence::domain::ports::{Methodology, TaskExecutor};
use cadence::services::methodology_selector::MethodologySelector;
use cadence::services::pattern_service::PatternService;
use cadence::{
    Config, ConvergenceController, DomainResult, Issue, PatternRepository, Pipeline, SessionStatus,
    Severity, Task, TaskSource,
};

/// Shared site state reviewed by methodologies and repaired by the executor.
#[derive(Default)]
struct Site {
    broken_link: AtomicBool,
}

struct SiteFixer {
    site: Arc<Site>,
}

#[async_trait]
impl TaskExecutor for SiteFixer {
    async fn execute(&self, task: &Task) -> DomainResult<serde_json::Value> {
        if matches!(task.source, TaskSource::FixFor { .. }) {
            self.site.broken_link.store(false, Ordering::SeqCst);
        }
        Ok(json!({"applied": true}))
    }
}

struct LinkChecker {
    name: String,
    site: Arc<Site>,
}

#[async_trait]
impl Methodology for LinkChecker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn review(&self, _deliverables: &[Deliverable]) -> DomainResult<Vec<Issue>> {
        if self.site.broken_link.load(Ordering::SeqCst) {
            Ok(vec![Issue::new(
                "dead link to archive page",
                "posts/index.html",
                Severity::Error,
                "links",
            )])
        } else {
            Ok(vec![])
        }
    }
}

fn methodologies(site: &Arc<Site>, names: &[&str]) -> Vec<Arc<dyn Methodology>> {
    names
        .iter()
        .map(|&name| {
            Arc::new(LinkChecker {
                name: name.to_string(),
                site: site.clone(),
            }) as Arc<dyn Methodology>
        })
        .collect()
}

fn controller(
    site: &Arc<Site>,
    repo: Arc<InMemoryPatternRepository>,
    config: ConvergenceConfig,
    seed: u64,
) -> ConvergenceController<InMemoryPatternRepository> {
    ConvergenceController::new(
        methodologies(site, &["structure", "accessibility", "links"]),
        PatternService::new(repo),
        config,
    )
    .expect("controller should build")
    .with_selector(MethodologySelector::with_seed(seed))
}

#[tokio::test]
async fn test_clean_deliverables_converge_in_exactly_three_passes() {
    let site = Arc::new(Site::default());
    let controller = controller(
        &site,
        Arc::new(InMemoryPatternRepository::new()),
        ConvergenceConfig::default(),
        5,
    );

    let report = controller
        .run_session(&[])
        .await
        .expect("session should finish");

    assert_eq!(report.session.status, SessionStatus::Converged);
    assert_eq!(report.session.total_passes, 3);

    let mut used: Vec<String> = report
        .session
        .issues_log
        .iter()
        .map(|r| r.methodology.clone())
        .collect();
    used.sort();
    used.dedup();
    assert_eq!(used.len(), 3, "each clean pass used a distinct methodology");
}

#[tokio::test]
async fn test_dirty_pass_resets_the_streak_and_synthesizes_fix_tasks() {
    let site = Arc::new(Site {
        broken_link: AtomicBool::new(true),
    });
    let repo = Arc::new(InMemoryPatternRepository::new());
    let config = Config::default();
    let pipeline = Pipeline::new(
        &config,
        controller(&site, repo, config.convergence.clone(), 5),
    );
    let executor = Arc::new(SiteFixer { site: site.clone() });

    let report = pipeline
        .run(vec![], executor, &[])
        .await
        .expect("pipeline should finish");

    assert!(report.converged());
    // Pass 1 was dirty, then a fresh streak of three clean passes.
    assert_eq!(report.session.dirty_passes(), 1);
    assert_eq!(report.session.total_passes, 4);
    assert_eq!(report.scheduling_runs.len(), 1);

    let fix_run = &report.scheduling_runs[0];
    assert_eq!(fix_run.total_tasks, 1);
    assert_eq!(fix_run.succeeded, 1);
}

#[tokio::test]
async fn test_never_clean_session_fails_at_the_pass_cap() {
    let site = Arc::new(Site {
        broken_link: AtomicBool::new(true),
    });
    let controller = controller(
        &site,
        Arc::new(InMemoryPatternRepository::new()),
        ConvergenceConfig {
            target_clean_passes: 3,
            max_passes: 6,
            reuse_scope: MethodologyReuse::PerStreak,
        },
        5,
    );

    // No executor runs, so the flaw is never repaired.
    let report = controller
        .run_session(&[])
        .await
        .expect("session should finish");

    assert_eq!(report.session.status, SessionStatus::FailedMaxIterations);
    assert_eq!(report.session.total_passes, 6);
    assert_eq!(report.fix_tasks.len(), 6);
}

#[tokio::test]
async fn test_converged_session_persists_a_successful_pattern() {
    let site = Arc::new(Site {
        broken_link: AtomicBool::new(true),
    });
    let repo = Arc::new(InMemoryPatternRepository::new());
    let config = Config::default();
    let pipeline = Pipeline::new(
        &config,
        controller(&site, repo.clone(), config.convergence.clone(), 5),
    );
    let executor = Arc::new(SiteFixer { site: site.clone() });

    let report = pipeline
        .run(vec![], executor, &[])
        .await
        .expect("pipeline should finish");
    assert!(report.converged());

    let patterns = repo
        .find("links::dead link to archive page")
        .await
        .expect("find should succeed");
    assert_eq!(patterns.len(), 1);
    // Recorded once as a candidate, once as resolved.
    assert_eq!(patterns[0].total_applications, 2);
    assert_eq!(patterns[0].success_count, 1);
    assert!(patterns[0].success_rate() > 0.0);
}

#[tokio::test]
async fn test_learned_fix_is_attached_to_later_fix_tasks() {
    let repo = Arc::new(InMemoryPatternRepository::new());
    let service = PatternService::new(repo.clone());
    let issue = Issue::new(
        "dead link to archive page",
        "posts/index.html",
        Severity::Error,
        "links",
    );
    service
        .mark_resolved(&issue, "point the link at /archive/")
        .await
        .expect("record should succeed");

    // A new session over a site with the same flaw.
    let site = Arc::new(Site {
        broken_link: AtomicBool::new(true),
    });
    let controller = controller(&site, repo, ConvergenceConfig::default(), 5);
    let mut session = controller.new_session();
    let outcome = controller
        .run_pass(&mut session, &[])
        .await
        .expect("pass should run");

    let fix_tasks = match outcome {
        cadence::services::convergence_controller::PassOutcome::Dirty { fix_tasks, .. } => fix_tasks,
        other => panic!("expected a dirty pass, got {other:?}"),
    };
    assert_eq!(fix_tasks.len(), 1);
    assert_eq!(
        fix_tasks[0].payload["known_fix"],
        json!("point the link at /archive/")
    );
    assert!(fix_tasks[0].touches.contains("posts/index.html"));
}
