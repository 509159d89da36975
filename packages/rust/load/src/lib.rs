//! libSQL warehouse loader.
//!
//! The [`DatabaseLoader`] persists transformed records into a local libSQL
//! database. Each record is keyed by its source and content fingerprint, and
//! every loader call is recorded as a row in `load_batches`.

mod migrations;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use salesetl_shared::{DatabaseConfig, EtlError, Record, Result, SourceKind};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Persists records and reports how many were written.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load one source's records. `mode` is interpreted by the loader.
    async fn load(&self, source: SourceKind, records: &[Record], mode: &str) -> Result<usize>;
}

// ---------------------------------------------------------------------------
// Load mode
// ---------------------------------------------------------------------------

/// Load strategies understood by [`DatabaseLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Insert records not already stored for the source.
    Incremental,
    /// Replace everything stored for the source.
    Full,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Full => "full",
        }
    }
}

impl FromStr for LoadMode {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "incremental" => Ok(Self::Incremental),
            "full" => Ok(Self::Full),
            other => Err(EtlError::validation(format!(
                "unknown load mode '{other}': expected 'incremental' or 'full'"
            ))),
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Batch history
// ---------------------------------------------------------------------------

/// One recorded loader invocation.
#[derive(Debug, Clone, Serialize)]
pub struct LoadBatch {
    pub id: String,
    pub source: String,
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records_written: Option<usize>,
}

// ---------------------------------------------------------------------------
// DatabaseLoader
// ---------------------------------------------------------------------------

/// Loader backed by a local libSQL database.
pub struct DatabaseLoader {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl DatabaseLoader {
    /// Open or create the database named by `config`, applying migrations.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let path = &config.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| EtlError::Storage(e.to_string()))?;

        let conn = db.connect().map_err(|e| EtlError::Storage(e.to_string()))?;

        let loader = Self { db, conn };
        loader.run_migrations().await?;
        Ok(loader)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    EtlError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Number of stored records, for one source or all of them.
    pub async fn count_records(&self, source: Option<SourceKind>) -> Result<usize> {
        let mut rows = match source {
            Some(source) => {
                self.conn
                    .query(
                        "SELECT COUNT(*) FROM sales_records WHERE source = ?1",
                        params![source.as_str()],
                    )
                    .await
            }
            None => {
                self.conn
                    .query("SELECT COUNT(*) FROM sales_records", params![])
                    .await
            }
        }
        .map_err(|e| EtlError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row
                .get::<i64>(0)
                .map_err(|e| EtlError::Storage(e.to_string()))? as usize),
            Ok(None) => Ok(0),
            Err(e) => Err(EtlError::Storage(e.to_string())),
        }
    }

    /// Load history, most recent first.
    pub async fn list_batches(&self, limit: usize) -> Result<Vec<LoadBatch>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, source, mode, started_at, finished_at, records_written
                 FROM load_batches ORDER BY started_at DESC, id DESC LIMIT ?1",
                params![limit as i64],
            )
            .await
            .map_err(|e| EtlError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| EtlError::Storage(e.to_string()))?
        {
            results.push(row_to_batch(&row)?);
        }
        Ok(results)
    }

    async fn begin_batch(&self, source: SourceKind, mode: LoadMode) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO load_batches (id, source, mode, started_at) VALUES (?1, ?2, ?3, ?4)",
                params![id.as_str(), source.as_str(), mode.as_str(), now.as_str()],
            )
            .await
            .map_err(|e| EtlError::Storage(e.to_string()))?;
        Ok(id)
    }

    async fn finish_batch(&self, batch_id: &str, written: usize) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE load_batches SET finished_at = ?1, records_written = ?2 WHERE id = ?3",
                params![now.as_str(), written as i64, batch_id],
            )
            .await
            .map_err(|e| EtlError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Loader for DatabaseLoader {
    #[instrument(skip_all, fields(source = %source, mode = mode, records = records.len()))]
    async fn load(&self, source: SourceKind, records: &[Record], mode: &str) -> Result<usize> {
        let mode: LoadMode = mode.parse()?;
        let batch_id = self.begin_batch(source, mode).await?;

        if mode == LoadMode::Full {
            let removed = self
                .conn
                .execute(
                    "DELETE FROM sales_records WHERE source = ?1",
                    params![source.as_str()],
                )
                .await
                .map_err(|e| EtlError::Storage(e.to_string()))?;
            debug!(removed, "cleared previous records for full load");
        }

        let loaded_at = Utc::now().to_rfc3339();
        let mut written = 0usize;
        for record in records {
            let changed = self
                .conn
                .execute(
                    "INSERT OR IGNORE INTO sales_records
                     (source, fingerprint, payload_json, batch_id, loaded_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        source.as_str(),
                        record.fingerprint(),
                        record.canonical_json(),
                        batch_id.as_str(),
                        loaded_at.as_str(),
                    ],
                )
                .await
                .map_err(|e| EtlError::Storage(e.to_string()))?;
            written += changed as usize;
        }

        self.finish_batch(&batch_id, written).await?;

        info!(
            %batch_id,
            written,
            skipped = records.len() - written,
            "load batch complete"
        );
        Ok(written)
    }
}

/// Convert a database row to a [`LoadBatch`].
fn row_to_batch(row: &libsql::Row) -> Result<LoadBatch> {
    Ok(LoadBatch {
        id: row
            .get::<String>(0)
            .map_err(|e| EtlError::Storage(e.to_string()))?,
        source: row
            .get::<String>(1)
            .map_err(|e| EtlError::Storage(e.to_string()))?,
        mode: row
            .get::<String>(2)
            .map_err(|e| EtlError::Storage(e.to_string()))?,
        started_at: {
            let s: String = row.get(3).map_err(|e| EtlError::Storage(e.to_string()))?;
            parse_timestamp(&s)?
        },
        finished_at: match row.get::<String>(4).ok() {
            Some(s) => Some(parse_timestamp(&s)?),
            None => None,
        },
        records_written: row.get::<i64>(5).ok().map(|v| v as usize),
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EtlError::Storage(format!("invalid date: {e}")))
}
