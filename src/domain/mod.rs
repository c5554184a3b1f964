//! Domain layer: pure models, errors, and the ports external collaborators
//! implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
