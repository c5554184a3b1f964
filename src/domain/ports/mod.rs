//! Ports: traits implemented by adapters and external collaborators.

pub mod checkpoint_repository;
pub mod methodology;
pub mod pattern_repository;
pub mod stuck_policy;
pub mod task_executor;

pub use checkpoint_repository::CheckpointRepository;
pub use methodology::Methodology;
pub use pattern_repository::PatternRepository;
pub use stuck_policy::{AttemptHistory, AttemptRecord, StuckPolicy, ThreeStrikes};
pub use task_executor::TaskExecutor;
