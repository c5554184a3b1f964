//! Learned antipattern records.
//!
//! A [`Pattern`] captures a recurring problem signature together with the
//! fix or prevention measure that was applied, and bookkeeping about how
//! often applying it worked. Patterns are never deleted, only superseded by
//! further recordings against the same signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A learned record of a recurring problem and its fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Pattern id.
    pub id: Uuid,
    /// Coarse issue category (matches `Issue::category`).
    pub category: String,
    /// Stable signature of the problem (matches `Issue::signature()`).
    pub problem_signature: String,
    /// The fix or prevention measure associated with the signature.
    pub prevention_or_fix: String,
    /// How many applications of the fix succeeded.
    pub success_count: u32,
    /// How many times the fix was applied in total.
    pub total_applications: u32,
    /// When the pattern was first recorded.
    pub created_at: DateTime<Utc>,
    /// When the pattern was last applied.
    pub last_applied_at: DateTime<Utc>,
}

impl Pattern {
    /// Create a fresh pattern from its first application.
    pub fn new(
        category: impl Into<String>,
        problem_signature: impl Into<String>,
        prevention_or_fix: impl Into<String>,
        succeeded: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            problem_signature: problem_signature.into(),
            prevention_or_fix: prevention_or_fix.into(),
            success_count: u32::from(succeeded),
            total_applications: 1,
            created_at: now,
            last_applied_at: now,
        }
    }

    /// Record another application of this pattern's fix.
    pub fn record_application(&mut self, prevention_or_fix: &str, succeeded: bool) {
        self.total_applications += 1;
        if succeeded {
            self.success_count += 1;
        }
        // Latest fix text supersedes the stored one.
        if !prevention_or_fix.is_empty() {
            self.prevention_or_fix = prevention_or_fix.to_string();
        }
        self.last_applied_at = Utc::now();
    }

    /// Fraction of applications that succeeded. Advisory only; callers
    /// decide whether to trust a pattern below some threshold.
    pub fn success_rate(&self) -> f64 {
        if self.total_applications == 0 {
            return 0.0;
        }
        f64::from(self.success_count) / f64::from(self.total_applications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_application_counts() {
        let p = Pattern::new("a11y", "a11y::missing alt", "add alt text", true);
        assert_eq!(p.total_applications, 1);
        assert_eq!(p.success_count, 1);
        assert!((p.success_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn success_rate_tracks_applications() {
        let mut p = Pattern::new("links", "links::dead link", "update href", false);
        p.record_application("update href", true);
        p.record_application("update href", true);
        p.record_application("update href", false);

        assert_eq!(p.total_applications, 4);
        assert_eq!(p.success_count, 2);
        assert!((p.success_rate() - 0.5).abs() < 0.001);
    }

    #[test]
    fn latest_fix_supersedes() {
        let mut p = Pattern::new("structure", "structure::no doctype", "prepend doctype", false);
        p.record_application("prepend html5 doctype", true);
        assert_eq!(p.prevention_or_fix, "prepend html5 doctype");
    }
}
