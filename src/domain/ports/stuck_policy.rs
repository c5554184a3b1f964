//! Pluggable stuck-detection policy for retries.
//!
//! Instead of hardcoding a fixed strike threshold, the retry policy consults
//! a [`StuckPolicy`] with the full attempt history and lets it decide when a
//! task should be abandoned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// One-based attempt number.
    pub attempt: u32,
    /// Error message from the attempt.
    pub error: String,
    /// When the attempt failed.
    pub failed_at: DateTime<Utc>,
}

/// Accumulated failure history for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptHistory {
    /// Failed attempts, in order.
    pub attempts: Vec<AttemptRecord>,
}

impl AttemptHistory {
    /// Record a failed attempt.
    pub fn record(&mut self, attempt: u32, error: impl Into<String>) {
        self.attempts.push(AttemptRecord {
            attempt,
            error: error.into(),
            failed_at: Utc::now(),
        });
    }

    /// Number of failed attempts so far.
    pub fn strikes(&self) -> u32 {
        self.attempts.len() as u32
    }

    /// The most recent error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.attempts.last().map(|record| record.error.as_str())
    }
}

/// Decides whether a task is stuck and should be abandoned.
pub trait StuckPolicy: Send + Sync {
    /// Return true when no further attempts should be made.
    fn should_abort(&self, history: &AttemptHistory) -> bool;
}

/// Default policy: abandon after a fixed number of strikes.
#[derive(Debug, Clone)]
pub struct ThreeStrikes {
    limit: u32,
}

impl ThreeStrikes {
    /// A policy abandoning after `limit` failed attempts.
    pub const fn with_limit(limit: u32) -> Self {
        Self { limit }
    }
}

impl Default for ThreeStrikes {
    fn default() -> Self {
        Self { limit: 3 }
    }
}

impl StuckPolicy for ThreeStrikes {
    fn should_abort(&self, history: &AttemptHistory) -> bool {
        history.strikes() >= self.limit
    }
}
