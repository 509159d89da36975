//! Record transformations: cleaning and validation.
//!
//! The orchestrator applies these per source, cleaning before validating.

mod cleaner;
mod validator;

use salesetl_shared::{Record, Result};

pub use cleaner::{CleaningStats, DataCleaner};
pub use validator::{DataValidator, ValidationIssue, ValidationReport};

/// Produces a new, cleaned record set.
pub trait Cleaner: Send + Sync {
    fn clean(&self, records: Vec<Record>) -> Result<Vec<Record>>;
}

/// Checks records against rules, keeping the valid ones.
pub trait Validator: Send + Sync {
    /// Returns the records that passed, plus a report on all of them.
    fn validate(&self, records: Vec<Record>) -> Result<(Vec<Record>, ValidationReport)>;
}
