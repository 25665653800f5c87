//! clipfit - shrink user videos to fit a fixed byte budget
//!
//! This library crate exposes the batch pipeline and configuration loading
//! for the CLI and for integration testing.

pub mod batch;
pub mod config;

pub use batch::{BatchOrchestrator, BatchRequest, BatchResult, Candidate, ConversionOutcome};
