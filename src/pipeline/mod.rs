//! Release-date pipeline
//!
//! This module contains:
//! - Request validation and the response wire types
//! - The stage machine of one run
//! - The bounded concurrency executor
//! - Deterministic result ordering
//! - The orchestrator tying sources, scraping and the catalogue together

mod executor;
mod orchestrator;
mod sort;
mod stage;
mod types;

pub use executor::{run_with_concurrency, TaskFailure};
pub use orchestrator::ReleasePipeline;
pub use sort::{compare_names, compare_results, sort_results};
pub use stage::{PipelineStage, StageTracker};
pub use types::{FilmResult, ReleaseRequest, ReleaseResponse, SourceSpec, ValidatedRequest};
