//! Error types for SalesETL.
//!
//! Library crates use [`EtlError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::Phase;

/// Top-level error type for all SalesETL operations.
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a source API.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed input (CSV rows, JSON payloads, etc.).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad rule, unknown load mode, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The extract phase failed; wraps the extractor's error.
    #[error("extract failed: {0}")]
    Extract(#[source] Box<EtlError>),

    /// The transform phase failed; wraps the cleaner's or validator's error.
    #[error("transform failed: {0}")]
    Transform(#[source] Box<EtlError>),

    /// The load phase failed; wraps the loader's error.
    #[error("load failed: {0}")]
    Load(#[source] Box<EtlError>),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EtlError>;

impl EtlError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a collaborator error in the variant for the phase it failed in.
    pub fn in_phase(phase: Phase, source: EtlError) -> Self {
        let source = Box::new(source);
        match phase {
            Phase::Extract => Self::Extract(source),
            Phase::Transform => Self::Transform(source),
            Phase::Load => Self::Load(source),
        }
    }

    /// The pipeline phase this error was raised in, if it is a phase error.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Extract(_) => Some(Phase::Extract),
            Self::Transform(_) => Some(Phase::Transform),
            Self::Load(_) => Some(Phase::Load),
            _ => None,
        }
    }
}
