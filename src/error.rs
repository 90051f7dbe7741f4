//! Error taxonomy for the ingest pipeline.
//!
//! `LoadError` and `SchemaError` abort the run before anything is persisted.
//! `PersistenceError` is reported by the driver and never undoes cleaning work.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no input sources configured")]
    NoSources,

    #[error("cannot open source {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("source {} is missing expected column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("source {} has an unusable header: {source}", path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("column '{0}' not present in record set")]
    MissingColumn(String),

    #[error("column '{0}' already present in record set")]
    DuplicateColumn(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("no database url configured")]
    NotConfigured,

    #[error("invalid destination table: {0}")]
    InvalidTable(String),

    #[error("unsupported database url scheme '{0}' (expected postgres, mysql or sqlite)")]
    UnsupportedScheme(String),

    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("table '{table}' column '{column}' has no counterpart in shaped records")]
    ColumnMismatch { table: String, column: String },

    #[error("write to '{table}' failed: {source}")]
    Write {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("fallback export to {} failed: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Fatal failures that stop the run before the sink is reached.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
