//! HTTP API extractor.
//!
//! Fetches a JSON document and reads its rows. The body may be a bare array
//! of objects, or an object wrapping the array under a known field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use salesetl_shared::{ApiConfig, EtlError, Record, Result};
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use crate::Extractor;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("SalesETL/", env!("CARGO_PKG_VERSION"));

/// Wrapper fields probed, in order, when no `records_field` is configured.
const WRAPPER_FIELDS: &[&str] = &["data", "records", "results"];

/// Reads records from an HTTP endpoint returning JSON.
#[derive(Debug, Clone)]
pub struct ApiExtractor {
    url: Url,
    client: Client,
    records_field: Option<String>,
}

impl ApiExtractor {
    pub fn new(url: Url, config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EtlError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url,
            client,
            records_field: config.records_field.clone(),
        })
    }
}

#[async_trait]
impl Extractor for ApiExtractor {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn extract(&self) -> Result<Vec<Record>> {
        let url = &self.url;
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| EtlError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EtlError::Network(format!("{url}: failed to read body: {e}")))?;

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| EtlError::parse(format!("{url}: invalid JSON: {e}")))?;

        let records = records_from_payload(payload, self.records_field.as_deref())?;
        info!(records = records.len(), "API extracted");
        Ok(records)
    }

    fn name(&self) -> &str {
        "api"
    }
}

/// Locate the row array in a payload and convert each row to a [`Record`].
fn records_from_payload(payload: Value, records_field: Option<&str>) -> Result<Vec<Record>> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => {
            let field = match records_field {
                Some(field) => field.to_string(),
                None => WRAPPER_FIELDS
                    .iter()
                    .find(|f| obj.get(**f).is_some_and(Value::is_array))
                    .map(|f| f.to_string())
                    .ok_or_else(|| {
                        EtlError::parse(format!(
                            "response object has none of the fields {WRAPPER_FIELDS:?}"
                        ))
                    })?,
            };
            debug!(%field, "reading records from wrapper field");
            match obj.remove(&field) {
                Some(Value::Array(rows)) => rows,
                _ => {
                    return Err(EtlError::parse(format!(
                        "response field '{field}' is not an array"
                    )));
                }
            }
        }
        other => {
            return Err(EtlError::parse(format!(
                "expected a JSON array or object, got {}",
                json_kind(&other)
            )));
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, flatten_value(v)))
                .collect::<Record>()),
            other => Err(EtlError::parse(format!(
                "row {i} is {}, expected an object",
                json_kind(&other)
            ))),
        })
        .collect()
}

/// Nested arrays/objects are kept as their JSON text.
fn flatten_value(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
