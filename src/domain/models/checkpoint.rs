//! Checkpoint model for resumable batch execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A durable snapshot of partial batch progress.
///
/// `position` is the index of the last item whose result is included in
/// `partial_results`; resuming re-executes everything after it. Results are
/// stored as opaque JSON so the batch item/result types stay caller-defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Identifies the batch this snapshot belongs to.
    pub batch_id: String,
    /// Index of the last completed item.
    pub position: usize,
    /// Results for items `0..=position`, in order.
    pub partial_results: Vec<serde_json::Value>,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(
        batch_id: impl Into<String>,
        position: usize,
        partial_results: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            position,
            partial_results,
            created_at: Utc::now(),
        }
    }
}
