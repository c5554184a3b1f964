//! Cadence - Dependency-Aware Task Execution with Convergent Review
//!
//! Cadence schedules batches of interdependent tasks for parallel execution
//! and then drives their deliverables through repeated independent review
//! passes until they converge, learning recurring issue patterns along the
//! way.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, errors and ports
//! - **Service Layer** (`services`): Graph building, scheduling, retry,
//!   checkpointing and the convergence loop
//! - **Adapters** (`adapters`): In-memory and JSON-file port implementations
//! - **Infrastructure Layer** (`infrastructure`): Configuration loading and
//!   logger setup
//!
//! # Example
//!
//! ```ignore
//! use cadence::{ConfigLoader, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     // Wire an executor, methodologies and a pattern store, then
//!     // Pipeline::run the batch to convergence.
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Checkpoint, Config, ConvergenceConfig, ConvergenceSession, Deliverable, ExecutionPlan,
    ExecutionResult, ExecutionStatus, Issue, MethodologyReuse, Pattern, RetryConfig,
    SchedulerConfig, SessionStatus, Severity, Task, TaskError, TaskSource,
};
pub use domain::ports::{
    CheckpointRepository, Methodology, PatternRepository, StuckPolicy, TaskExecutor, ThreeStrikes,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::Logger;
pub use services::{
    BatchProcessor, ConvergenceController, GraphBuilder, Pipeline, PipelineReport, RunResults,
    RunStatus, Scheduler, SchedulerEvent, SessionReport,
};
