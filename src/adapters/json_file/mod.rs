//! File-backed adapters.

pub mod pattern_repository;

pub use pattern_repository::JsonFilePatternRepository;
