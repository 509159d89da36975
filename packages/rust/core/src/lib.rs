//! Pipeline orchestration for SalesETL.
//!
//! Ties the extract, transform, and load crates together behind
//! [`PipelineOrchestrator`], which records every phase call in an
//! append-only execution log.

pub mod collaborators;
pub mod pipeline;

pub use collaborators::{Collaborators, DefaultCollaborators};
pub use pipeline::{PipelineOrchestrator, ProgressReporter, RunSummary, SilentProgress};
