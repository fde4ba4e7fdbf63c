//! HeartMap application binary - composition root.
//!
//! Two subcommands share one configuration:
//! 1. `ingest` loads the source CSV into SQLite, replacing what was there
//! 2. `serve` starts the axum API over the same database

mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use heartmap_api::state::AppState;
use heartmap_core::config::HeartMapConfig;
use heartmap_ingest::{InclusionPolicy, IngestJob, IngestOutcome};
use heartmap_storage::Database;

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = HeartMapConfig::load_or_default(&config_file);

    // Tracing. RUST_LOG wins over the flag and config.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!(
        path = %config_file.display(),
        "Starting HeartMap v{}",
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        Command::Ingest { source, mode, json } => {
            run_ingest(config, source, mode.as_deref(), json)
        }
        Command::Serve { port, host } => run_serve(config, port, host).await,
    }
}

fn run_ingest(
    mut config: HeartMapConfig,
    source: Option<PathBuf>,
    mode: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    config.ingest.mode = cli::resolve_mode(mode, config.ingest.mode)?;
    let source = source.unwrap_or_else(|| config.ingest.source_path());

    let db_path = PathBuf::from(&config.storage.db_path);
    let db = Arc::new(Database::new(&db_path)?);

    let job = IngestJob::new(db, InclusionPolicy::from_config(&config.ingest));
    tracing::info!(
        mode = ?config.ingest.mode,
        policy = ?job.policy(),
        db = %db_path.display(),
        "Ingest configured"
    );

    let outcome = job.run(&source)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        if outcome.source_missing {
            eprintln!("Source file not found: {}", outcome.source.display());
        }
    } else {
        print_summary(&outcome, &db_path);
    }
    Ok(())
}

fn print_summary(outcome: &IngestOutcome, db_path: &Path) {
    if outcome.source_missing {
        eprintln!(
            "Source file not found: {}. The store at {} has been cleared.",
            outcome.source.display(),
            db_path.display()
        );
        eprintln!("Place the CSV at that path or pass --source.");
        return;
    }

    println!("Loaded {} records into {}", outcome.inserted, db_path.display());
    println!("  rows scanned:        {}", outcome.rows_scanned);
    println!("  filtered out:        {}", outcome.skipped_filtered);
    println!("  over cap:            {}", outcome.skipped_capped);
    println!("  blank value:         {}", outcome.skipped_blank_value);
    println!("  invalid:             {}", outcome.skipped_invalid);
    for (keyword, count) in &outcome.per_topic {
        println!("  topic '{}': {}", keyword, count);
    }
    if outcome.stopped_early {
        println!("  (stopped early: all caps reached)");
    }
}

async fn run_serve(
    mut config: HeartMapConfig,
    port: Option<u16>,
    host: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    config.api.port = cli::resolve_port(port, config.api.port);
    if let Some(host) = host {
        config.api.host = host;
    }

    let db_path = PathBuf::from(&config.storage.db_path);
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let state = AppState::new(config, db);
    match state.query_service.stats() {
        Ok(stats) if stats.total_records == 0 => {
            tracing::warn!("Store is empty; run `heartmap ingest` first");
        }
        Ok(stats) => tracing::info!(
            records = stats.total_records,
            states = stats.states,
            topics = stats.topics,
            years = stats.years,
            "Store ready"
        ),
        Err(e) => tracing::warn!(error = %e, "Could not read store stats"),
    }

    heartmap_api::start_server(state).await?;
    Ok(())
}
