//! Domain models: tasks, graphs, convergence state, patterns, checkpoints,
//! and configuration.

pub mod checkpoint;
pub mod config;
pub mod convergence;
pub mod graph;
pub mod pattern;
pub mod task;

pub use checkpoint::Checkpoint;
pub use config::{
    CheckpointConfig, Config, ConvergenceConfig, LoggingConfig, RetryConfig, SchedulerConfig,
};
pub use convergence::{
    ConvergenceSession, Deliverable, Issue, MethodologyReuse, PassRecord, SessionStatus, Severity,
};
pub use graph::{ConflictGroup, ExecutionPlan, Level, LevelPartition};
pub use pattern::Pattern;
pub use task::{ExecutionResult, ExecutionStatus, Task, TaskError, TaskSource};
