pub mod columns;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod normalization;
pub mod pipeline;
pub mod records;
pub mod shape;
pub mod sink;

pub mod util {
    pub mod db;
    pub mod env;
}

pub use config::{PipelineConfig, SinkConfig, TableSpec};
pub use error::{LoadError, PersistenceError, PipelineError, SchemaError};
pub use pipeline::{clean, run, RunOutcome, RunSummary, SinkOutcome};
pub use records::{Record, RecordSet};
