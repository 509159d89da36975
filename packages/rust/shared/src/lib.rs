//! Shared types, error model, and configuration for SalesETL.
//!
//! This crate is the foundation depended on by all other SalesETL crates.
//! It provides:
//! - [`EtlError`], the unified error type
//! - Domain types ([`Record`], [`Dataset`], [`SourceKind`], [`Rule`], [`ExecutionLogEntry`])
//! - Configuration ([`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, DEFAULT_CONFIG_PATH, DatabaseConfig, LoggingConfig, PipelineConfig,
    ValidationConfig, init_config, load_config_from, parse_config,
};
pub use error::{EtlError, Result};
pub use types::{
    Dataset, ExecutionLogEntry, ExtractedData, Phase, PhaseOutcome, PhaseStatus, Record, Rule,
    SourceKind, TransformedData, is_missing,
};
