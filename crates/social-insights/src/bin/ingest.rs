//! Post ingestion binary
//!
//! Run with: cargo run -p social-insights --bin social-insights-ingest

use clap::Parser;
use social_insights::config::{env_lookup, IngestConfig};
use social_insights::{run_ingestion, IngestReport, StoreBackend};
use std::path::PathBuf;
use std::process::ExitCode;

/// Load a post analytics export into the table store.
///
/// Settings come from the environment (EXCEL_FILE_PATH, STORE_BACKEND,
/// ASTRA_DB_API_ENDPOINT, ...); flags override them.
#[derive(Parser)]
#[command(name = "social-insights-ingest", version, about, long_about = None)]
struct Args {
    /// Spreadsheet or CSV export to load
    #[arg(long)]
    source: Option<PathBuf>,

    /// Maximum number of rows to load
    #[arg(long)]
    limit: Option<usize>,

    /// Directory for the CSV archive
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// Create the post table before loading
    #[arg(long)]
    setup_schema: bool,

    /// Table store backend: astra or sqlite
    #[arg(long)]
    backend: Option<String>,

    /// SQLite database file (sqlite backend)
    #[arg(long)]
    sqlite_path: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    social_insights::logging::init("social_insights_ingest");

    let args = Args::parse();
    report(run(args).await)
}

async fn run(args: Args) -> anyhow::Result<IngestReport> {
    let config = load_config(args)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Source: {}", config.source_path.display());
    tracing::info!("  - Limit: {}", config.limit);
    tracing::info!("  - Archive dir: {}", config.archive_dir.display());
    tracing::info!("  - Store backend: {:?}", config.store.backend);
    tracing::info!("  - Table: {}.{}", config.store.keyspace, config.store.table);

    Ok(run_ingestion(&config).await?)
}

/// Log the run outcome once and map it to the process exit code
fn report(result: anyhow::Result<IngestReport>) -> ExitCode {
    match result {
        Ok(report) => {
            tracing::info!(
                "Data import completed successfully: {} of {} rows loaded, archive {}",
                report.inserted,
                report.rows_read,
                report.archive_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: Args) -> anyhow::Result<IngestConfig> {
    // Flags stand in for missing variables, so apply them to the lookup
    // before required values are checked.
    let source = args.source.clone();
    let mut config = IngestConfig::from_lookup(|key| match key {
        "EXCEL_FILE_PATH" => source
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| env_lookup(key)),
        _ => env_lookup(key),
    })?;

    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    if let Some(dir) = args.archive_dir {
        config.archive_dir = dir;
    }
    if args.setup_schema {
        config.setup_schema = true;
    }
    if let Some(backend) = args.backend {
        config.store.backend = backend.parse::<StoreBackend>()?;
    }
    if let Some(path) = args.sqlite_path {
        config.store.sqlite_path = path;
    }
    Ok(config)
}
