//! Convergence domain models.
//!
//! A [`ConvergenceSession`] tracks repeated independent review passes over a
//! deliverable set. A pass is clean when its methodology reports no issues;
//! the session converges after a configured number of consecutive clean
//! passes, each from a distinct methodology.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a reported issue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

/// A problem reported by a review methodology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// What is wrong.
    pub description: String,
    /// Where it was found (deliverable name, path, selector, line...).
    pub location: String,
    /// How bad it is.
    pub severity: Severity,
    /// Coarse classification used as the signature prefix (e.g. "a11y",
    /// "structure", "links").
    pub category: String,
}

impl Issue {
    pub fn new(
        description: impl Into<String>,
        location: impl Into<String>,
        severity: Severity,
        category: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            location: location.into(),
            severity,
            category: category.into(),
        }
    }

    /// Stable signature used to match the issue against learned patterns.
    /// Location is deliberately excluded so the same problem in different
    /// places maps to one pattern.
    pub fn signature(&self) -> String {
        format!("{}::{}", self.category, self.description)
    }
}

/// A deliverable handed to review methodologies. The core treats the
/// content as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deliverable {
    /// Name used in issue locations (e.g. a file path).
    pub name: String,
    /// Opaque content the methodology inspects.
    pub content: serde_json::Value,
}

impl Deliverable {
    pub fn new(name: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

/// Terminal and non-terminal states of a convergence session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Passes are still being run.
    Running,
    /// The clean-streak target was reached.
    Converged,
    /// The pass cap was reached without convergence.
    FailedMaxIterations,
}

impl SessionStatus {
    /// Whether the session has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Scope of the no-reuse rule for methodologies.
///
/// The source material is ambiguous about whether "no reuse" applies only
/// within the current unbroken clean streak or across the whole session, so
/// both behaviors are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MethodologyReuse {
    /// A dirty pass makes every methodology eligible again.
    #[default]
    PerStreak,
    /// A methodology used once is never reused in this session.
    PerSession,
}

/// One entry in the append-only pass log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRecord {
    /// One-based pass number.
    pub pass: u32,
    /// Methodology that ran the pass.
    pub methodology: String,
    /// Issues reported; empty for a clean pass.
    pub issues: Vec<Issue>,
    /// When the pass completed.
    pub completed_at: DateTime<Utc>,
}

impl PassRecord {
    /// Whether the pass reported no issues.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issue counts keyed by severity, most severe last.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_insert(0) += 1;
        }
        counts
    }
}

/// State for one convergence run. Mutated only by the convergence
/// controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceSession {
    /// Session id.
    pub id: Uuid,
    /// Names of all methodologies available to this session.
    pub available_methodologies: Vec<String>,
    /// Methodologies already counted toward the current clean streak.
    pub used_in_streak: HashSet<String>,
    /// Methodologies used at any point in the session (for
    /// [`MethodologyReuse::PerSession`]).
    pub used_in_session: HashSet<String>,
    /// Current number of consecutive clean passes.
    pub consecutive_clean: u32,
    /// Total passes run so far.
    pub total_passes: u32,
    /// Append-only log of every pass.
    pub issues_log: Vec<PassRecord>,
    /// Current status.
    pub status: SessionStatus,
    /// When the session started.
    pub started_at: DateTime<Utc>,
}

impl ConvergenceSession {
    /// Start a new session over the given methodology names.
    pub fn new(available_methodologies: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            available_methodologies,
            used_in_streak: HashSet::new(),
            used_in_session: HashSet::new(),
            consecutive_clean: 0,
            total_passes: 0,
            issues_log: Vec::new(),
            status: SessionStatus::Running,
            started_at: Utc::now(),
        }
    }

    /// Methodologies eligible for the next pass under the given reuse scope.
    pub fn eligible_methodologies(&self, reuse: MethodologyReuse) -> Vec<&str> {
        let used = match reuse {
            MethodologyReuse::PerStreak => &self.used_in_streak,
            MethodologyReuse::PerSession => &self.used_in_session,
        };
        self.available_methodologies
            .iter()
            .filter(|name| !used.contains(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Record a clean pass by `methodology`. The methodology cannot
    /// contribute to the streak again until the streak resets.
    pub fn record_clean(&mut self, methodology: &str) {
        self.consecutive_clean += 1;
        self.used_in_streak.insert(methodology.to_string());
        self.used_in_session.insert(methodology.to_string());
        self.issues_log.push(PassRecord {
            pass: self.total_passes,
            methodology: methodology.to_string(),
            issues: Vec::new(),
            completed_at: Utc::now(),
        });
    }

    /// Record a dirty pass: the clean streak and its used set reset, and the
    /// issues are appended to the log.
    pub fn record_dirty(&mut self, methodology: &str, issues: Vec<Issue>) {
        self.consecutive_clean = 0;
        self.used_in_streak.clear();
        self.used_in_session.insert(methodology.to_string());
        self.issues_log.push(PassRecord {
            pass: self.total_passes,
            methodology: methodology.to_string(),
            issues,
            completed_at: Utc::now(),
        });
    }

    /// All issues reported across the whole session, in discovery order.
    pub fn all_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues_log.iter().flat_map(|record| record.issues.iter())
    }

    /// Count of dirty passes so far.
    pub fn dirty_passes(&self) -> usize {
        self.issues_log.iter().filter(|r| !r.is_clean()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ConvergenceSession {
        ConvergenceSession::new(vec![
            "structure".to_string(),
            "accessibility".to_string(),
            "links".to_string(),
        ])
    }

    #[test]
    fn clean_pass_marks_methodology_used_in_streak() {
        let mut s = session();
        s.total_passes = 1;
        s.record_clean("structure");

        assert_eq!(s.consecutive_clean, 1);
        let eligible = s.eligible_methodologies(MethodologyReuse::PerStreak);
        assert_eq!(eligible, vec!["accessibility", "links"]);
    }

    #[test]
    fn dirty_pass_resets_streak_and_used_set() {
        let mut s = session();
        s.total_passes = 1;
        s.record_clean("structure");
        s.total_passes = 2;
        s.record_dirty(
            "accessibility",
            vec![Issue::new("missing alt", "index.html", Severity::Error, "a11y")],
        );

        assert_eq!(s.consecutive_clean, 0);
        assert!(s.used_in_streak.is_empty());
        assert_eq!(
            s.eligible_methodologies(MethodologyReuse::PerStreak).len(),
            3
        );
        assert_eq!(s.dirty_passes(), 1);
    }

    #[test]
    fn per_session_scope_never_forgets() {
        let mut s = session();
        s.total_passes = 1;
        s.record_dirty(
            "structure",
            vec![Issue::new("bad heading", "a.html", Severity::Warning, "structure")],
        );

        let eligible = s.eligible_methodologies(MethodologyReuse::PerSession);
        assert_eq!(eligible, vec!["accessibility", "links"]);
    }

    #[test]
    fn severity_counts_order_from_least_to_most_severe() {
        let record = PassRecord {
            pass: 1,
            methodology: "structure".to_string(),
            issues: vec![
                Issue::new("a", "x", Severity::Critical, "c"),
                Issue::new("b", "x", Severity::Warning, "c"),
                Issue::new("c", "x", Severity::Warning, "c"),
            ],
            completed_at: Utc::now(),
        };

        let counts = record.severity_counts();
        let ordered: Vec<_> = counts.into_iter().collect();
        assert_eq!(
            ordered,
            vec![(Severity::Warning, 2), (Severity::Critical, 1)]
        );
    }

    #[test]
    fn signature_excludes_location() {
        let a = Issue::new("missing alt", "a.html", Severity::Error, "a11y");
        let b = Issue::new("missing alt", "b.html", Severity::Error, "a11y");
        assert_eq!(a.signature(), b.signature());
    }
}
