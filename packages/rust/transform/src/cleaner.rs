//! Row-level cleanup for raw records.
//!
//! Passes, in order: trim string cells, drop exact duplicates (first
//! occurrence wins), drop rows with any missing value.

use std::collections::HashSet;

use salesetl_shared::{Record, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::Cleaner;

/// What a cleaning pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub input_records: usize,
    pub duplicates_removed: usize,
    pub incomplete_removed: usize,
}

impl CleaningStats {
    pub fn output_records(&self) -> usize {
        self.input_records - self.duplicates_removed - self.incomplete_removed
    }
}

/// The default [`Cleaner`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DataCleaner;

impl DataCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Clean `records`, also reporting what was dropped.
    pub fn clean_with_stats(&self, records: Vec<Record>) -> (Vec<Record>, CleaningStats) {
        let mut stats = CleaningStats {
            input_records: records.len(),
            ..Default::default()
        };

        let mut seen = HashSet::new();
        let mut cleaned = Vec::with_capacity(records.len());

        for mut record in records {
            trim_strings(&mut record);

            if !seen.insert(record.fingerprint()) {
                stats.duplicates_removed += 1;
                continue;
            }
            if record.has_missing() {
                stats.incomplete_removed += 1;
                continue;
            }
            cleaned.push(record);
        }

        debug!(
            input = stats.input_records,
            duplicates = stats.duplicates_removed,
            incomplete = stats.incomplete_removed,
            "cleaning pass complete"
        );

        (cleaned, stats)
    }
}

impl Cleaner for DataCleaner {
    fn clean(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        Ok(self.clean_with_stats(records).0)
    }
}

fn trim_strings(record: &mut Record) {
    for (_, value) in record.fields_mut() {
        if let Value::String(s) = value {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
    }
}
