//! Construction of the extractors, transformers, and loader a pipeline uses.

use async_trait::async_trait;
use salesetl_extract::{ApiExtractor, CsvExtractor, Extractor};
use salesetl_load::{DatabaseLoader, Loader};
use salesetl_shared::{DatabaseConfig, PipelineConfig, Result, SourceKind};
use salesetl_transform::{Cleaner, DataCleaner, DataValidator, Validator};

/// Factory for the orchestrator's collaborators.
///
/// Called once per phase invocation; instantiation errors count as failures
/// of the phase that asked.
#[async_trait]
pub trait Collaborators: Send + Sync {
    /// Build the extractor for `source` from its config values.
    fn extractor(&self, source: SourceKind, config: &PipelineConfig) -> Result<Box<dyn Extractor>>;

    fn cleaner(&self, config: &PipelineConfig) -> Box<dyn Cleaner>;

    fn validator(&self, config: &PipelineConfig) -> Box<dyn Validator>;

    /// Open a loader bound to the database block.
    async fn loader(&self, config: &DatabaseConfig) -> Result<Box<dyn Loader>>;
}

/// The built-in CSV/API extractors, cleaner, validator, and libSQL loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCollaborators;

#[async_trait]
impl Collaborators for DefaultCollaborators {
    fn extractor(&self, source: SourceKind, config: &PipelineConfig) -> Result<Box<dyn Extractor>> {
        match source {
            SourceKind::Csv => Ok(Box::new(CsvExtractor::new(config.require_csv_path()?))),
            SourceKind::Api => Ok(Box::new(ApiExtractor::new(
                config.require_api_url()?,
                &config.api,
            )?)),
        }
    }

    fn cleaner(&self, _config: &PipelineConfig) -> Box<dyn Cleaner> {
        Box::new(DataCleaner::new())
    }

    fn validator(&self, config: &PipelineConfig) -> Box<dyn Validator> {
        Box::new(DataValidator::new(config.validation.clone()))
    }

    async fn loader(&self, config: &DatabaseConfig) -> Result<Box<dyn Loader>> {
        Ok(Box::new(DatabaseLoader::open(config).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesetl_shared::parse_config;

    #[test]
    fn extractor_requires_source_setting() {
        let config = parse_config("[database]\npath = \"x.db\"\n").unwrap();
        let err = DefaultCollaborators
            .extractor(SourceKind::Csv, &config)
            .err()
            .expect("csv_path missing");
        assert!(err.to_string().contains("csv_path"));

        let err = DefaultCollaborators
            .extractor(SourceKind::Api, &config)
            .err()
            .expect("api_url missing");
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn extractor_built_from_config() {
        let config = parse_config(
            "csv_path = \"data/vendas.csv\"\napi_url = \"http://localhost:9/sales\"\n\
             [database]\npath = \"x.db\"\n",
        )
        .unwrap();

        let csv = DefaultCollaborators.extractor(SourceKind::Csv, &config).unwrap();
        assert_eq!(csv.name(), "csv");

        let api = DefaultCollaborators.extractor(SourceKind::Api, &config).unwrap();
        assert_eq!(api.name(), "api");
    }
}
