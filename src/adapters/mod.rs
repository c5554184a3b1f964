//! Adapters: concrete implementations of the domain ports.

pub mod json_file;
pub mod memory;
