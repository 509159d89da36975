//! CSV file extractor.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use salesetl_shared::{EtlError, Record, Result};
use serde_json::{Number, Value};
use tracing::{debug, info, instrument};

use crate::Extractor;

/// Cell values read as null, in addition to blank cells.
const NULL_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Reads a headed CSV file into records, one per row.
#[derive(Debug, Clone)]
pub struct CsvExtractor {
    path: PathBuf,
}

impl CsvExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Extractor for CsvExtractor {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn extract(&self) -> Result<Vec<Record>> {
        let path = self.path.clone();
        let records = tokio::task::spawn_blocking(move || read_records(&path))
            .await
            .map_err(|e| EtlError::io(&self.path, std::io::Error::other(e)))??;

        info!(records = records.len(), "CSV extracted");
        Ok(records)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Read every row of the file at `path`. Blocking.
fn read_records(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    debug!(columns = headers.len(), "read CSV header");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| csv_error(path, e))?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| (name.clone(), parse_cell(cell)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Type a raw cell: blank/null tokens → null, then integer, float, bool, string.
///
/// Numeric-looking codes are typed as numbers, so leading zeros are not
/// kept (`"00123"` becomes `123`).
fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NULL_TOKENS.contains(&trimmed) {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match trimmed {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn csv_error(path: &Path, err: csv::Error) -> EtlError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => EtlError::io(path, source),
        _ => EtlError::parse(format!("{}: {message}", path.display())),
    }
}
