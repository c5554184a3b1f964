//! Logger initialization on top of tracing.

mod logger;

pub use logger::Logger;
