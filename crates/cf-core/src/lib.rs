//! cf-core: shared error type, configuration, media types, and the size
//! budget planner.
//!
//! This crate is the foundational dependency for the other clipfit crates. It
//! performs no I/O apart from configuration sanity checks on tool paths.

pub mod budget;
pub mod config;
pub mod error;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use budget::BudgetPlanner;
pub use error::{Error, Result};
pub use media::*;
