//! Source extractors: read raw sales records from a CSV file or an HTTP API.
//!
//! Each extractor is constructed with its one source-specific parameter
//! (a path or a URL) and exposes [`Extractor::extract`].

mod api;
mod csv_file;

use async_trait::async_trait;
use salesetl_shared::{Record, Result};

pub use api::ApiExtractor;
pub use csv_file::CsvExtractor;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A source of raw tabular records.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Read every record from the source, in source order.
    async fn extract(&self) -> Result<Vec<Record>>;

    /// Human-readable extractor name for tracing.
    fn name(&self) -> &str;
}
