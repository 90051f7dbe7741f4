//! Stage wiring: load → identity → urls → misplaced → dates → shape → sink.
//!
//! Every stage takes the `RecordSet` by value and returns it. Load and schema
//! failures abort the run; a sink failure is logged and the shaped records
//! are handed back to the caller regardless.

use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, SchemaError};
use crate::loader::load_sources;
use crate::normalization::{
    correct_misplaced, normalize_dates, reconcile_identity, reconcile_urls,
};
use crate::records::RecordSet;
use crate::shape::shape_for_output;
use crate::sink;

/// Run the four repair stages in their fixed order.
pub fn clean(set: RecordSet) -> Result<RecordSet, SchemaError> {
    let set = reconcile_identity(set)?;
    let set = reconcile_urls(set)?;
    let set = correct_misplaced(set)?;
    normalize_dates(set)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SinkOutcome {
    Skipped,
    Written { rows: u64 },
    Failed { error: String, fallback_csv: Option<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sources: usize,
    pub rows_loaded: usize,
    pub rows_shaped: usize,
    pub elapsed_ms: u64,
    pub sink: SinkOutcome,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// Shaped records, kept even when the sink failed.
    pub records: RecordSet,
}

#[instrument(skip_all, fields(sources = config.sources.len(), table = %config.table.name))]
pub async fn run(config: &PipelineConfig) -> Result<RunOutcome, PipelineError> {
    let started = Instant::now();

    let loaded = load_sources(&config.sources, &config.date_column)?;
    let rows_loaded = loaded.len();
    let shaped = shape_for_output(clean(loaded)?)?;

    let sink = if config.dry_run {
        info!(rows = shaped.len(), "dry run; sink skipped");
        SinkOutcome::Skipped
    } else {
        match sink::persist(&config.sink, &config.table, &shaped).await {
            Ok(rows) => SinkOutcome::Written { rows },
            Err(err) => SinkOutcome::Failed {
                error: err.to_string(),
                fallback_csv: write_fallback(config, &shaped),
            },
        }
    };

    let summary = RunSummary {
        sources: config.sources.len(),
        rows_loaded,
        rows_shaped: shaped.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        sink,
    };
    info!(?summary, "pipeline finished");
    Ok(RunOutcome {
        summary,
        records: shaped,
    })
}

fn write_fallback(config: &PipelineConfig, shaped: &RecordSet) -> Option<String> {
    let Some(path) = config.sink.fallback_csv.as_deref() else {
        warn!("sink failed and no fallback csv configured; cleaned records stay in memory only");
        return None;
    };
    match sink::export_csv(shaped, path) {
        Ok(()) => Some(path.display().to_string()),
        Err(e) => {
            error!(error = %e, "fallback export failed");
            None
        }
    }
}
