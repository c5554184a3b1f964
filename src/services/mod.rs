//! Service layer: graph building, scheduling, convergence and the
//! supporting policies.

pub mod checkpoint;
pub mod conflict_partitioner;
pub mod convergence_controller;
pub mod graph_builder;
pub mod methodology_selector;
pub mod pattern_service;
pub mod pipeline;
pub mod retry;
pub mod scheduler;

pub use checkpoint::BatchProcessor;
pub use conflict_partitioner::ConflictPartitioner;
pub use convergence_controller::{
    ConvergenceController, ConvergenceEvent, PassOutcome, SessionReport,
};
pub use graph_builder::GraphBuilder;
pub use methodology_selector::MethodologySelector;
pub use pattern_service::PatternService;
pub use pipeline::{Pipeline, PipelineReport};
pub use retry::{Attempted, RetryPolicy};
pub use scheduler::{RunResults, RunStatus, Scheduler, SchedulerEvent};
