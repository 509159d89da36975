//! Pipeline configuration for SalesETL.
//!
//! The config is a TOML document read once at startup, by default
//! `config/salesetl.toml` relative to the working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EtlError, Result};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/salesetl.toml";

// ---------------------------------------------------------------------------
// Config structs (matching salesetl.toml schema)
// ---------------------------------------------------------------------------

/// Top-level pipeline config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Path to the sales CSV file. Required by the `csv` source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,

    /// Endpoint returning sales records as JSON. Required by the `api` source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Database connection block. Required.
    pub database: DatabaseConfig,

    /// API extractor settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Validation rules.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Log file settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local libSQL database file.
    pub path: PathBuf,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP timeout in seconds.
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,

    /// JSON field holding the record array when the body is an object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_field: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_api_timeout(),
            records_field: None,
        }
    }
}

fn default_api_timeout() -> u64 {
    30
}

/// `[validation]` section. Every list defaults to empty (no checks).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Fields that must be present and non-null.
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Fields that must hold a number greater than zero.
    #[serde(default)]
    pub positive_fields: Vec<String>,

    /// Fields that must hold a parseable date.
    #[serde(default)]
    pub date_fields: Vec<String>,

    /// Field → regex the string value must match.
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for timestamped pipeline log files.
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl PipelineConfig {
    /// Config for the bundled sales dataset layout.
    pub fn sample() -> Self {
        Self {
            csv_path: Some(PathBuf::from("data/raw/vendas.csv")),
            api_url: None,
            database: DatabaseConfig {
                path: PathBuf::from("data/warehouse/sales.db"),
            },
            api: ApiConfig::default(),
            validation: ValidationConfig {
                required_fields: [
                    "data_venda",
                    "id_produto",
                    "id_cliente",
                    "quantidade",
                    "preco_unitario",
                ]
                .map(String::from)
                .to_vec(),
                positive_fields: vec!["quantidade".into(), "preco_unitario".into()],
                date_fields: vec!["data_venda".into()],
                patterns: BTreeMap::new(),
            },
            logging: LoggingConfig::default(),
        }
    }

    /// The CSV path, or a config error if the `csv` source has none.
    pub fn require_csv_path(&self) -> Result<&Path> {
        self.csv_path
            .as_deref()
            .ok_or_else(|| EtlError::config("csv source requested but `csv_path` is not set"))
    }

    /// The parsed API URL, or a config error if missing or malformed.
    pub fn require_api_url(&self) -> Result<Url> {
        let raw = self
            .api_url
            .as_deref()
            .ok_or_else(|| EtlError::config("api source requested but `api_url` is not set"))?;
        Url::parse(raw).map_err(|e| EtlError::config(format!("invalid `api_url` '{raw}': {e}")))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the pipeline config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        EtlError::config(format!("failed to read {}: {e}", path.display()))
    })?;

    parse_config(&content)
        .map_err(|e| EtlError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Parse a config document.
pub fn parse_config(content: &str) -> std::result::Result<PipelineConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Write the sample config to `path`, creating parent directories.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| EtlError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&PipelineConfig::sample())
        .map_err(|e| EtlError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| EtlError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}
