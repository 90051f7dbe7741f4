use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use seo_ingest::config::{ConfigOverrides, PipelineConfig};
use seo_ingest::logging::{init_tracing, DEFAULT_FILTER};
use seo_ingest::pipeline::{self, SinkOutcome};
use seo_ingest::util::env as env_util;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "seo_ingest",
    version,
    about = "Clean contact export CSVs and append them to the SEO table"
)]
struct Cli {
    /// CSV exports to load, in order. Falls back to SEO_SOURCES (comma-separated).
    sources: Vec<PathBuf>,
    /// Destination DSN (postgres://, mysql://, sqlite:).
    /// Falls back to SEO_DATABASE_URL / DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,
    /// Destination table name (default SEO_table).
    #[arg(long)]
    table: Option<String>,
    /// Rows per INSERT statement.
    #[arg(long)]
    batch_size: Option<usize>,
    /// Where to write the shaped records if the sink fails.
    #[arg(long)]
    fallback_csv: Option<PathBuf>,
    /// Run every cleaning stage but skip the database.
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            sources: cli.sources,
            database_url: cli.database_url,
            table: cli.table,
            batch_size: cli.batch_size,
            fallback_csv: cli.fallback_csv,
            dry_run: cli.dry_run || env_util::env_flag("SEO_DRY_RUN", false),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing(DEFAULT_FILTER)?;

    let cli = Cli::parse();
    let config = PipelineConfig::resolve(cli.into());
    env_util::preflight_check("seo_ingest", &config);

    let outcome = pipeline::run(&config)
        .await
        .context("cleaning pipeline aborted")?;

    match &outcome.summary.sink {
        SinkOutcome::Failed { error, .. } => {
            warn!(error = %error, "records cleaned but not persisted")
        }
        SinkOutcome::Written { rows } => info!(rows, "records persisted"),
        SinkOutcome::Skipped => {}
    }
    println!(
        "{}",
        serde_json::to_string(&outcome.summary).context("serialize run summary")?
    );
    Ok(())
}
