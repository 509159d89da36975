//! The ETL orchestrator: extract → transform → load with an execution log.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use salesetl_shared::{
    Dataset, EtlError, ExecutionLogEntry, ExtractedData, Phase, PipelineConfig, Result, Rule,
    SourceKind, TransformedData, load_config_from,
};
use serde::{Serialize, Serializer};
use tracing::{debug, error, info, instrument};

use crate::collaborators::{Collaborators, DefaultCollaborators};

/// Totals for a completed [`PipelineOrchestrator::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub extracted: usize,
    pub transformed: usize,
    pub loaded: usize,
    /// Wall-clock time for all three phases.
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when a phase begins.
    fn phase_started(&self, phase: Phase);
    /// Called before a phase handles one source.
    fn source_started(&self, phase: Phase, source: SourceKind);
    /// Called with the log entry a phase just appended.
    fn phase_finished(&self, entry: &ExecutionLogEntry);
    /// Called when `run` completes.
    fn done(&self, summary: &RunSummary);
    /// Called when `run` aborts.
    fn aborted(&self, error: &EtlError);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase_started(&self, _phase: Phase) {}
    fn source_started(&self, _phase: Phase, _source: SourceKind) {}
    fn phase_finished(&self, _entry: &ExecutionLogEntry) {}
    fn done(&self, _summary: &RunSummary) {}
    fn aborted(&self, _error: &EtlError) {}
}

/// Runs the extract, transform, and load phases and records each outcome.
///
/// Every phase call appends exactly one entry to the execution log, whether
/// it succeeds or fails. Failures are logged, then returned wrapped in the
/// phase's [`EtlError`] variant.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    collaborators: Box<dyn Collaborators>,
    progress: Box<dyn ProgressReporter>,
    execution_log: Vec<ExecutionLogEntry>,
}

impl PipelineOrchestrator {
    /// Load the TOML config at `path` and use the default collaborators.
    pub fn from_config_path(path: &Path) -> Result<Self> {
        let config = load_config_from(path)?;
        Ok(Self::new(config, Box::new(DefaultCollaborators)))
    }

    pub fn new(config: PipelineConfig, collaborators: Box<dyn Collaborators>) -> Self {
        info!("ETL pipeline initialized");
        Self {
            config,
            collaborators,
            progress: Box::new(SilentProgress),
            execution_log: Vec::new(),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Every entry appended so far, oldest first.
    pub fn execution_log(&self) -> &[ExecutionLogEntry] {
        &self.execution_log
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    /// Extract each recognized source in `sources` (`csv`, `api`).
    ///
    /// Unrecognized identifiers are skipped. Any extractor failure fails the
    /// whole phase and no partial data is returned.
    pub async fn extract<S: AsRef<str>>(&mut self, sources: &[S]) -> Result<ExtractedData> {
        info!(phase = %Phase::Extract, "starting phase");
        self.progress.phase_started(Phase::Extract);

        let sources = SourceKind::resolve(sources);
        let result = self.extract_sources(&sources).await;
        self.finish(Phase::Extract, result, Dataset::total_records)
    }

    /// Apply the recognized `rules` (`clean`, `validate`) to every source.
    ///
    /// Cleaning always runs before validation; either may run alone.
    pub fn transform<R: AsRef<str>>(
        &mut self,
        data: ExtractedData,
        rules: &[R],
    ) -> Result<TransformedData> {
        info!(phase = %Phase::Transform, "starting phase");
        self.progress.phase_started(Phase::Transform);

        let rules = Rule::resolve(rules);
        let result = self.apply_rules(data, &rules);
        self.finish(Phase::Transform, result, Dataset::total_records)
    }

    /// Load every source through one loader. `mode` is passed through as is.
    pub async fn load(&mut self, data: &TransformedData, mode: &str) -> Result<usize> {
        info!(phase = %Phase::Load, mode, "starting phase");
        self.progress.phase_started(Phase::Load);

        let result = self.load_sources(data, mode).await;
        self.finish(Phase::Load, result, |total| *total)
    }

    /// Run extract → transform → load, stopping at the first failure.
    #[instrument(skip_all, fields(mode = load_mode))]
    pub async fn run<S: AsRef<str>, R: AsRef<str>>(
        &mut self,
        extract_sources: &[S],
        transform_rules: &[R],
        load_mode: &str,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        info!("starting ETL pipeline");

        match self.run_phases(extract_sources, transform_rules, load_mode).await {
            Ok((extracted, transformed, loaded)) => {
                let summary = RunSummary {
                    extracted,
                    transformed,
                    loaded,
                    elapsed: start.elapsed(),
                };
                info!(
                    extracted,
                    transformed,
                    loaded,
                    elapsed_secs = format!("{:.2}", summary.elapsed.as_secs_f64()),
                    "pipeline completed successfully"
                );
                self.progress.done(&summary);
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "pipeline failed");
                self.progress.aborted(&e);
                Err(e)
            }
        }
    }

    async fn run_phases<S: AsRef<str>, R: AsRef<str>>(
        &mut self,
        sources: &[S],
        rules: &[R],
        mode: &str,
    ) -> Result<(usize, usize, usize)> {
        let extracted = self.extract(sources).await?;
        let extracted_count = extracted.total_records();

        let transformed = self.transform(extracted, rules)?;
        let transformed_count = transformed.total_records();

        let loaded = self.load(&transformed, mode).await?;
        Ok((extracted_count, transformed_count, loaded))
    }

    // -----------------------------------------------------------------------
    // Phase bodies
    // -----------------------------------------------------------------------

    async fn extract_sources(&self, sources: &BTreeSet<SourceKind>) -> Result<Dataset> {
        let mut data = Dataset::new();

        for &source in sources {
            info!(%source, "extracting");
            self.progress.source_started(Phase::Extract, source);

            let extractor = self.collaborators.extractor(source, &self.config)?;
            let records = extractor.extract().await?;

            info!(%source, extractor = extractor.name(), records = records.len(), "extracted");
            data.insert(source, records);
        }

        Ok(data)
    }

    fn apply_rules(&self, data: ExtractedData, rules: &BTreeSet<Rule>) -> Result<Dataset> {
        let cleaner = rules
            .contains(&Rule::Clean)
            .then(|| self.collaborators.cleaner(&self.config));
        let validator = rules
            .contains(&Rule::Validate)
            .then(|| self.collaborators.validator(&self.config));

        let mut transformed = Dataset::new();

        for (source, mut records) in data {
            info!(%source, records = records.len(), "transforming");
            self.progress.source_started(Phase::Transform, source);

            if let Some(cleaner) = &cleaner {
                records = cleaner.clean(records)?;
                info!(%source, records = records.len(), "cleaned");
            }

            if let Some(validator) = &validator {
                let (valid, report) = validator.validate(records)?;
                info!(
                    %source,
                    valid_records = report.valid_records,
                    invalid_records = report.invalid_records,
                    "validated"
                );
                for issue in &report.issues {
                    debug!(%source, row = issue.row, field = %issue.field, reason = %issue.reason, "invalid record");
                }
                records = valid;
            }

            transformed.insert(source, records);
        }

        Ok(transformed)
    }

    async fn load_sources(&self, data: &TransformedData, mode: &str) -> Result<usize> {
        let loader = self.collaborators.loader(&self.config.database).await?;

        let mut total = 0;
        for (source, records) in data.iter() {
            info!(%source, records = records.len(), "loading");
            self.progress.source_started(Phase::Load, source);

            let written = loader.load(source, records, mode).await?;
            total += written;
            info!(%source, written, "loaded");
        }

        info!(total, "load complete");
        Ok(total)
    }

    /// Append the phase's log entry and wrap a failure in the phase's error.
    fn finish<T>(
        &mut self,
        phase: Phase,
        result: Result<T>,
        count: impl FnOnce(&T) -> usize,
    ) -> Result<T> {
        let entry = match &result {
            Ok(value) => {
                let records = count(value);
                info!(%phase, records, "phase succeeded");
                ExecutionLogEntry::success(phase, records)
            }
            Err(e) => {
                error!(%phase, error = %e, "phase failed");
                ExecutionLogEntry::failure(phase, e.to_string())
            }
        };

        self.progress.phase_finished(&entry);
        self.execution_log.push(entry);
        result.map_err(|e| EtlError::in_phase(phase, e))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use salesetl_extract::Extractor;
    use salesetl_load::Loader;
    use salesetl_shared::{DatabaseConfig, PhaseStatus, Record, ValidationConfig};
    use salesetl_transform::{Cleaner, DataCleaner, DataValidator, Validator};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    // -----------------------------------------------------------------------
    // Scripted collaborators
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct Script {
        csv_rows: usize,
        api_rows: usize,
        fail_extract: Option<SourceKind>,
        fail_clean: bool,
        fail_load: bool,
        /// (source, record count, mode) per loader call.
        loads: Arc<Mutex<Vec<(SourceKind, usize, String)>>>,
    }

    struct FakeExtractor {
        rows: usize,
        fail: bool,
    }

    #[async_trait]
    impl Extractor for FakeExtractor {
        async fn extract(&self) -> Result<Vec<Record>> {
            if self.fail {
                return Err(EtlError::Network("connection refused".into()));
            }
            Ok((0..self.rows)
                .map(|i| Record::from_iter([("id", json!(i)), ("quantidade", json!(1))]))
                .collect())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    struct FailingCleaner;

    impl Cleaner for FailingCleaner {
        fn clean(&self, _records: Vec<Record>) -> Result<Vec<Record>> {
            Err(EtlError::parse("bad cell"))
        }
    }

    struct MemoryLoader {
        fail: bool,
        loads: Arc<Mutex<Vec<(SourceKind, usize, String)>>>,
    }

    #[async_trait]
    impl Loader for MemoryLoader {
        async fn load(&self, source: SourceKind, records: &[Record], mode: &str) -> Result<usize> {
            if self.fail {
                return Err(EtlError::Storage("database is locked".into()));
            }
            self.loads
                .lock()
                .unwrap()
                .push((source, records.len(), mode.to_string()));
            Ok(records.len())
        }
    }

    #[async_trait]
    impl Collaborators for Script {
        fn extractor(
            &self,
            source: SourceKind,
            _config: &PipelineConfig,
        ) -> Result<Box<dyn Extractor>> {
            let rows = match source {
                SourceKind::Csv => self.csv_rows,
                SourceKind::Api => self.api_rows,
            };
            Ok(Box::new(FakeExtractor {
                rows,
                fail: self.fail_extract == Some(source),
            }))
        }

        fn cleaner(&self, _config: &PipelineConfig) -> Box<dyn Cleaner> {
            if self.fail_clean {
                Box::new(FailingCleaner)
            } else {
                Box::new(DataCleaner::new())
            }
        }

        fn validator(&self, config: &PipelineConfig) -> Box<dyn Validator> {
            Box::new(DataValidator::new(config.validation.clone()))
        }

        async fn loader(&self, _config: &DatabaseConfig) -> Result<Box<dyn Loader>> {
            Ok(Box::new(MemoryLoader {
                fail: self.fail_load,
                loads: Arc::clone(&self.loads),
            }))
        }
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            validation: ValidationConfig::default(),
            ..PipelineConfig::sample()
        }
    }

    fn orchestrator(script: Script) -> PipelineOrchestrator {
        PipelineOrchestrator::new(test_config(), Box::new(script))
    }

    fn phases(log: &[ExecutionLogEntry]) -> Vec<(Phase, PhaseStatus)> {
        log.iter().map(|e| (e.phase, e.status())).collect()
    }

    // -----------------------------------------------------------------------
    // extract
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn extract_keeps_only_recognized_sources() {
        let mut pipeline = orchestrator(Script {
            csv_rows: 4,
            api_rows: 2,
            ..Default::default()
        });

        let data = pipeline.extract(&["db", "api", "csv", "s3"]).await.unwrap();
        assert_eq!(
            data.sources().collect::<Vec<_>>(),
            vec![SourceKind::Csv, SourceKind::Api]
        );
        assert_eq!(pipeline.execution_log()[0].records(), Some(6));

        let data = pipeline.extract(&["api"]).await.unwrap();
        assert_eq!(data.sources().collect::<Vec<_>>(), vec![SourceKind::Api]);

        let data = pipeline.extract(&["db"]).await.unwrap();
        assert!(data.is_empty());
        assert_eq!(pipeline.execution_log()[2].records(), Some(0));
    }

    #[tokio::test]
    async fn extract_failure_is_logged_and_wrapped() {
        let mut pipeline = orchestrator(Script {
            csv_rows: 4,
            fail_extract: Some(SourceKind::Api),
            ..Default::default()
        });

        let err = pipeline.extract(&["csv", "api"]).await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Extract));
        assert!(matches!(err, EtlError::Extract(_)));

        let log = pipeline.execution_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status(), PhaseStatus::Error);
        assert!(log[0].records().is_none());
        assert!(log[0].error().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn missing_source_setting_fails_extract() {
        let config = PipelineConfig {
            csv_path: None,
            ..test_config()
        };
        let mut pipeline = PipelineOrchestrator::new(config, Box::new(DefaultCollaborators));

        let err = pipeline.extract(&["csv"]).await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Extract));
        assert_eq!(pipeline.execution_log()[0].status(), PhaseStatus::Error);
    }

    // -----------------------------------------------------------------------
    // transform
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn validate_runs_without_clean() {
        let mut pipeline = PipelineOrchestrator::new(
            PipelineConfig {
                validation: ValidationConfig {
                    positive_fields: vec!["quantidade".into()],
                    ..Default::default()
                },
                ..PipelineConfig::sample()
            },
            Box::new(Script::default()),
        );

        let mut data = Dataset::new();
        data.insert(
            SourceKind::Csv,
            vec![
                Record::from_iter([("quantidade", json!(2))]),
                Record::from_iter([("quantidade", json!(2))]),
                Record::from_iter([("quantidade", json!(-1))]),
            ],
        );

        let out = pipeline.transform(data, &["validate"]).unwrap();
        // duplicates survive: no cleaning was requested
        assert_eq!(out.total_records(), 2);
        assert_eq!(pipeline.execution_log()[0].records(), Some(2));
    }

    #[tokio::test]
    async fn transform_ignores_unknown_rules() {
        let mut pipeline = orchestrator(Script::default());

        let mut data = Dataset::new();
        data.insert(SourceKind::Api, vec![Record::new(), Record::new()]);

        let out = pipeline.transform(data.clone(), &["enrich"]).unwrap();
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn transform_failure_is_logged_and_wrapped() {
        let mut pipeline = orchestrator(Script {
            fail_clean: true,
            ..Default::default()
        });

        let mut data = Dataset::new();
        data.insert(SourceKind::Csv, vec![Record::new()]);

        let err = pipeline.transform(data, &["clean", "validate"]).unwrap_err();
        assert!(matches!(err, EtlError::Transform(_)));
        assert_eq!(
            phases(pipeline.execution_log()),
            vec![(Phase::Transform, PhaseStatus::Error)]
        );
    }

    // -----------------------------------------------------------------------
    // load
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn load_passes_mode_through_and_sums_counts() {
        let script = Script::default();
        let loads = Arc::clone(&script.loads);
        let mut pipeline = orchestrator(script);

        let mut data = Dataset::new();
        data.insert(SourceKind::Csv, vec![Record::new(); 3]);
        data.insert(SourceKind::Api, vec![Record::new(); 4]);

        let total = pipeline.load(&data, "upsert-by-key").await.unwrap();
        assert_eq!(total, 7);
        assert_eq!(pipeline.execution_log()[0].records(), Some(7));

        let loads = loads.lock().unwrap();
        assert_eq!(
            *loads,
            vec![
                (SourceKind::Csv, 3, "upsert-by-key".to_string()),
                (SourceKind::Api, 4, "upsert-by-key".to_string()),
            ]
        );
    }

    // -----------------------------------------------------------------------
    // run
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn successful_run_logs_three_phases_in_order() {
        let mut pipeline = orchestrator(Script {
            csv_rows: 5,
            api_rows: 3,
            ..Default::default()
        });

        let summary = pipeline
            .run(&["csv", "api"], &["clean", "validate"], "incremental")
            .await
            .unwrap();
        assert_eq!(summary.extracted, 8);
        assert_eq!(summary.transformed, 8);
        assert_eq!(summary.loaded, 8);

        assert_eq!(
            phases(pipeline.execution_log()),
            vec![
                (Phase::Extract, PhaseStatus::Success),
                (Phase::Transform, PhaseStatus::Success),
                (Phase::Load, PhaseStatus::Success),
            ]
        );
    }

    #[tokio::test]
    async fn run_stops_at_failing_phase() {
        let mut pipeline = orchestrator(Script {
            csv_rows: 5,
            fail_clean: true,
            ..Default::default()
        });

        let err = pipeline
            .run(&["csv"], &["clean"], "incremental")
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Transform));
        assert_eq!(
            phases(pipeline.execution_log()),
            vec![
                (Phase::Extract, PhaseStatus::Success),
                (Phase::Transform, PhaseStatus::Error),
            ]
        );

        let mut pipeline = orchestrator(Script {
            csv_rows: 5,
            fail_load: true,
            ..Default::default()
        });
        let err = pipeline.run(&["csv"], &["clean"], "full").await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Load));
        let log = pipeline.execution_log();
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().filter(|e| e.phase == Phase::Load).count(), 1);
        assert_eq!(log[2].status(), PhaseStatus::Error);
    }

    #[tokio::test]
    async fn run_failing_in_extract_never_reaches_load() {
        let script = Script {
            csv_rows: 5,
            fail_extract: Some(SourceKind::Csv),
            ..Default::default()
        };
        let loads = Arc::clone(&script.loads);
        let mut pipeline = orchestrator(script);

        let err = pipeline
            .run(&["csv"], &["clean", "validate"], "incremental")
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Extract));
        assert_eq!(
            phases(pipeline.execution_log()),
            vec![(Phase::Extract, PhaseStatus::Error)]
        );
        assert!(loads.lock().unwrap().is_empty());
    }

    /// Counts `done`/`aborted` calls.
    #[derive(Clone, Default)]
    struct RecordingProgress {
        done: Arc<Mutex<Vec<RunSummary>>>,
        aborted: Arc<Mutex<usize>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase_started(&self, _phase: Phase) {}
        fn source_started(&self, _phase: Phase, _source: SourceKind) {}
        fn phase_finished(&self, _entry: &ExecutionLogEntry) {}

        fn done(&self, summary: &RunSummary) {
            self.done.lock().unwrap().push(summary.clone());
        }

        fn aborted(&self, _error: &EtlError) {
            *self.aborted.lock().unwrap() += 1;
        }
    }

    #[tokio::test]
    async fn summary_reported_only_after_successful_run() {
        let progress = RecordingProgress::default();
        let mut pipeline = orchestrator(Script {
            csv_rows: 3,
            ..Default::default()
        })
        .with_progress(Box::new(progress.clone()));

        // standalone phase calls never produce a run summary
        let data = pipeline.extract(&["csv"]).await.unwrap();
        let data = pipeline.transform(data, &["clean"]).unwrap();
        pipeline.load(&data, "incremental").await.unwrap();
        assert!(progress.done.lock().unwrap().is_empty());

        let summary = pipeline.run(&["csv"], &["clean"], "incremental").await.unwrap();
        {
            let done = progress.done.lock().unwrap();
            assert_eq!(done.len(), 1);
            assert_eq!(done[0].loaded, summary.loaded);
        }
        assert_eq!(*progress.aborted.lock().unwrap(), 0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["extracted"], 3);
        assert!(json["elapsed_secs"].as_f64().is_some());

        let progress = RecordingProgress::default();
        let mut failing = orchestrator(Script {
            csv_rows: 3,
            fail_load: true,
            ..Default::default()
        })
        .with_progress(Box::new(progress.clone()));
        failing.run(&["csv"], &["clean"], "full").await.unwrap_err();
        assert!(progress.done.lock().unwrap().is_empty());
        assert_eq!(*progress.aborted.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn execution_log_is_stable_between_calls() {
        let mut pipeline = orchestrator(Script {
            csv_rows: 1,
            ..Default::default()
        });
        pipeline.run(&["csv"], &["clean"], "incremental").await.unwrap();

        let first = pipeline.execution_log().to_vec();
        let second = pipeline.execution_log().to_vec();
        assert_eq!(first, second);

        pipeline.extract(&["csv"]).await.unwrap();
        assert_eq!(pipeline.execution_log().len(), 4);
        assert_eq!(&pipeline.execution_log()[..3], first.as_slice());
    }

    // -----------------------------------------------------------------------
    // End to end over the default collaborators
    // -----------------------------------------------------------------------

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("salesetl_{}_{name}", Uuid::now_v7()))
    }

    /// 100 rows: 92 distinct valid sales, 5 repeats of earlier rows, 3 with a null.
    fn sales_csv() -> String {
        let mut lines = vec!["data_venda,id_produto,id_cliente,quantidade,preco_unitario".to_string()];
        let row = |i: usize| {
            format!(
                "2024-01-{:02},P{:03},C{:03},{},{}.50",
                i % 28 + 1,
                i,
                i % 17,
                i % 5 + 1,
                i + 10
            )
        };
        lines.extend((0..92).map(row));
        lines.extend((0..5).map(row));
        lines.extend((0..3).map(|i| format!("2024-02-01,P9{i:02},C001,,12.00")));
        lines.join("\n") + "\n"
    }

    #[tokio::test]
    async fn end_to_end_sales_csv() {
        let csv_path = temp_path("vendas.csv");
        std::fs::write(&csv_path, sales_csv()).unwrap();

        let config = PipelineConfig {
            csv_path: Some(csv_path),
            database: DatabaseConfig {
                path: temp_path("sales.db"),
            },
            ..PipelineConfig::sample()
        };
        let config_path = temp_path("salesetl.toml");
        std::fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let mut pipeline = PipelineOrchestrator::from_config_path(&config_path).unwrap();
        let summary = pipeline
            .run(&["csv"], &["clean", "validate"], "incremental")
            .await
            .unwrap();

        let log = pipeline.execution_log();
        assert_eq!(log[0].records(), Some(100));
        assert_eq!(log[1].records(), Some(92));
        assert!(log[2].records().unwrap() <= 92);
        assert_eq!(summary.loaded, 92);

        // A second incremental run writes nothing new.
        let again = pipeline
            .run(&["csv"], &["clean", "validate"], "incremental")
            .await
            .unwrap();
        assert_eq!(again.loaded, 0);
        assert_eq!(pipeline.execution_log().len(), 6);
    }

    #[test]
    fn bad_config_path_is_config_error() {
        let err = PipelineOrchestrator::from_config_path(Path::new("/nonexistent/salesetl.toml"))
            .err()
            .expect("missing config");
        assert!(matches!(err, EtlError::Config { .. }));
    }
}
