//! Core domain types for the sales ETL pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::EtlError;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// One of the three pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Extract,
    Transform,
    Load,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Load => "load",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SourceKind / Rule
// ---------------------------------------------------------------------------

/// A recognized origin of raw records.
///
/// Declaration order is extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Api,
}

impl SourceKind {
    /// Every recognized source, in extraction order.
    pub const ALL: [SourceKind; 2] = [SourceKind::Csv, SourceKind::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Api => "api",
        }
    }

    /// Resolve requested identifiers against the recognized set.
    ///
    /// Unrecognized identifiers are skipped, not rejected.
    pub fn resolve<S: AsRef<str>>(ids: &[S]) -> BTreeSet<SourceKind> {
        resolve_ids(ids, "source")
    }
}

impl FromStr for SourceKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "api" => Ok(Self::Api),
            other => Err(EtlError::validation(format!("unknown source '{other}'"))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A recognized transformation step.
///
/// Declaration order is application order: cleaning always precedes validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Clean,
    Validate,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Validate => "validate",
        }
    }

    /// Resolve requested identifiers against the recognized set.
    ///
    /// Unrecognized identifiers are skipped, not rejected.
    pub fn resolve<S: AsRef<str>>(ids: &[S]) -> BTreeSet<Rule> {
        resolve_ids(ids, "rule")
    }
}

impl FromStr for Rule {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clean" => Ok(Self::Clean),
            "validate" => Ok(Self::Validate),
            other => Err(EtlError::validation(format!("unknown rule '{other}'"))),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

fn resolve_ids<T, S>(ids: &[S], kind: &str) -> BTreeSet<T>
where
    T: FromStr + Ord,
    S: AsRef<str>,
{
    let mut resolved = BTreeSet::new();
    for id in ids {
        match id.as_ref().parse::<T>() {
            Ok(value) => {
                resolved.insert(value);
            }
            Err(_) => tracing::debug!(kind, id = id.as_ref(), "ignoring unrecognized identifier"),
        }
    }
    resolved
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One tabular row: column name → JSON scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = (&String, &mut Value)> {
        self.0.iter_mut()
    }

    /// Whether any cell is null or a blank string.
    pub fn has_missing(&self) -> bool {
        self.0.values().any(is_missing)
    }

    /// Canonical JSON: keys sorted, no insignificant whitespace.
    ///
    /// `Map` is key-ordered (serde_json without `preserve_order`), so plain
    /// compact serialization is canonical.
    pub fn canonical_json(&self) -> String {
        // string-keyed maps of JSON values always serialize
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// SHA-256 of the canonical JSON, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_json().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Null, or a string that is empty after trimming.
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Records grouped by the source they came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset(BTreeMap<SourceKind, Vec<Record>>);

/// Output of the extract phase.
pub type ExtractedData = Dataset;

/// Output of the transform phase; same shape as [`ExtractedData`].
pub type TransformedData = Dataset;

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: SourceKind, records: Vec<Record>) {
        self.0.insert(source, records);
    }

    pub fn sources(&self) -> impl Iterator<Item = SourceKind> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &[Record])> {
        self.0.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of record counts across all sources.
    pub fn total_records(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl IntoIterator for Dataset {
    type Item = (SourceKind, Vec<Record>);
    type IntoIter = std::collections::btree_map::IntoIter<SourceKind, Vec<Record>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(SourceKind, Vec<Record>)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (SourceKind, Vec<Record>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Execution log
// ---------------------------------------------------------------------------

/// Success or error, as reported in the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Success,
    Error,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// What a phase call produced: a record count, or the error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PhaseOutcome {
    Success { records: usize },
    Error { error: String },
}

/// One entry in the orchestrator's append-only execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub phase: Phase,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: PhaseOutcome,
}

impl ExecutionLogEntry {
    pub fn success(phase: Phase, records: usize) -> Self {
        Self {
            phase,
            timestamp: Utc::now(),
            outcome: PhaseOutcome::Success { records },
        }
    }

    pub fn failure(phase: Phase, error: impl Into<String>) -> Self {
        Self {
            phase,
            timestamp: Utc::now(),
            outcome: PhaseOutcome::Error {
                error: error.into(),
            },
        }
    }

    pub fn status(&self) -> PhaseStatus {
        match self.outcome {
            PhaseOutcome::Success { .. } => PhaseStatus::Success,
            PhaseOutcome::Error { .. } => PhaseStatus::Error,
        }
    }

    /// Record count; only present on success.
    pub fn records(&self) -> Option<usize> {
        match self.outcome {
            PhaseOutcome::Success { records } => Some(records),
            PhaseOutcome::Error { .. } => None,
        }
    }

    /// Error text; only present on failure.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            PhaseOutcome::Success { .. } => None,
            PhaseOutcome::Error { error } => Some(error),
        }
    }
}
