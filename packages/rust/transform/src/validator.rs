//! Rule-based record validation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use salesetl_shared::{EtlError, Record, Result, ValidationConfig, is_missing};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::Validator;

/// Maximum number of issues kept in a report.
const MAX_ISSUES: usize = 100;

/// Date formats accepted in addition to RFC 3339.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One failed check on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Zero-based position of the row in the validator's input.
    pub row: usize,
    pub field: String,
    pub reason: String,
}

/// Summary of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    /// First issues found, capped at [`MAX_ISSUES`].
    pub issues: Vec<ValidationIssue>,
}

/// The default [`Validator`], driven by the `[validation]` config section.
#[derive(Debug, Clone, Default)]
pub struct DataValidator {
    rules: ValidationConfig,
}

impl DataValidator {
    pub fn new(rules: ValidationConfig) -> Self {
        Self { rules }
    }

    fn compile_patterns(&self) -> Result<Vec<(&str, Regex)>> {
        self.rules
            .patterns
            .iter()
            .map(|(field, pattern)| {
                Regex::new(pattern)
                    .map(|re| (field.as_str(), re))
                    .map_err(|e| {
                        EtlError::validation(format!("invalid pattern for '{field}': {e}"))
                    })
            })
            .collect()
    }

    fn check(&self, record: &Record, patterns: &[(&str, Regex)]) -> Vec<(String, String)> {
        let mut failures = Vec::new();

        for field in &self.rules.required_fields {
            if record.get(field).is_none_or(is_missing) {
                failures.push((field.clone(), "missing required value".to_string()));
            }
        }

        for field in &self.rules.positive_fields {
            if let Some(value) = present(record, field) {
                match as_number(value) {
                    Some(n) if n > 0.0 => {}
                    Some(n) => failures.push((field.clone(), format!("must be positive, got {n}"))),
                    None => failures.push((field.clone(), format!("not a number: {value}"))),
                }
            }
        }

        for field in &self.rules.date_fields {
            if let Some(value) = present(record, field) {
                if !is_date(value) {
                    failures.push((field.clone(), format!("not a date: {value}")));
                }
            }
        }

        for (field, re) in patterns {
            if let Some(value) = present(record, field) {
                let text = as_text(value);
                if !re.is_match(&text) {
                    failures.push((field.to_string(), format!("'{text}' does not match {re}")));
                }
            }
        }

        failures
    }
}

impl Validator for DataValidator {
    #[instrument(skip_all, fields(records = records.len()))]
    fn validate(&self, records: Vec<Record>) -> Result<(Vec<Record>, ValidationReport)> {
        let patterns = self.compile_patterns()?;

        let mut report = ValidationReport {
            total_records: records.len(),
            ..Default::default()
        };
        let mut valid = Vec::with_capacity(records.len());

        for (row, record) in records.into_iter().enumerate() {
            let failures = self.check(&record, &patterns);
            if failures.is_empty() {
                valid.push(record);
                continue;
            }

            report.invalid_records += 1;
            for (field, reason) in failures {
                if report.issues.len() < MAX_ISSUES {
                    report.issues.push(ValidationIssue { row, field, reason });
                }
            }
        }

        report.valid_records = valid.len();
        debug!(
            valid = report.valid_records,
            invalid = report.invalid_records,
            "validation pass complete"
        );

        Ok((valid, report))
    }
}

/// The field's value, unless absent or missing.
fn present<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !is_missing(v))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_date(value: &Value) -> bool {
    let Value::String(s) = value else {
        return false;
    };
    let s = s.trim();

    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || DateTime::parse_from_rfc3339(s).is_ok()
}
