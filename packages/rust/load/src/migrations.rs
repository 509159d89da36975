//! SQL migration definitions for the sales warehouse database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: sales_records, load_batches",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Loaded records, keyed by source and content fingerprint
CREATE TABLE IF NOT EXISTS sales_records (
    source       TEXT NOT NULL,
    fingerprint  TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    batch_id     TEXT NOT NULL,
    loaded_at    TEXT NOT NULL,
    PRIMARY KEY (source, fingerprint)
);

CREATE INDEX IF NOT EXISTS idx_sales_records_batch ON sales_records(batch_id);

-- One row per loader invocation
CREATE TABLE IF NOT EXISTS load_batches (
    id              TEXT PRIMARY KEY,
    source          TEXT NOT NULL,
    mode            TEXT NOT NULL,
    started_at      TEXT NOT NULL,
    finished_at     TEXT,
    records_written INTEGER
);

CREATE INDEX IF NOT EXISTS idx_load_batches_source ON load_batches(source);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
