//! In-memory adapters for the repository ports.

pub mod checkpoint_repository;
pub mod pattern_repository;

pub use checkpoint_repository::InMemoryCheckpointRepository;
pub use pattern_repository::InMemoryPatternRepository;
