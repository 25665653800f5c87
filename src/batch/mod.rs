//! Batch conversion: request and outcome types plus the orchestrator that
//! drives each candidate through the pipeline.

mod orchestrator;
mod outcome;
mod request;

pub use orchestrator::{BatchOrchestrator, OutputMode};
pub use outcome::{
    output_name, output_names, BatchResult, ConversionOutcome, ConvertedFile, Delivery, Stage,
};
pub use request::{BatchRequest, Candidate, CandidateSource};
