//! CLI argument definitions for the HeartMap application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use heartmap_core::config::IngestMode;
use heartmap_core::error::HeartMapError;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "HEARTMAP_CONFIG";
/// Environment variable overriding the API port.
pub const PORT_ENV: &str = "HEARTMAP_PORT";
/// Config file used when neither flag nor env var names one.
pub const DEFAULT_CONFIG_FILE: &str = "heartmap.toml";

/// HeartMap - heart disease and stroke statistics by US state.
#[derive(Parser, Debug)]
#[command(name = "heartmap", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the source CSV into the store, replacing its contents.
    Ingest {
        /// CSV file to read instead of the configured one.
        #[arg(short = 's', long = "source")]
        source: Option<PathBuf>,

        /// Inclusion preset: capped or multi-year.
        #[arg(short = 'm', long = "mode")]
        mode: Option<String>,

        /// Print the run outcome as JSON instead of a text summary.
        #[arg(long = "json")]
        json: bool,
    },
    /// Serve the map API.
    Serve {
        /// API server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,

        /// Address to bind.
        #[arg(long = "host")]
        host: Option<String>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HEARTMAP_CONFIG env var > ./heartmap.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        config_path_from(self.config.as_ref(), std::env::var(CONFIG_ENV).ok())
    }

    /// Resolve the log filter when RUST_LOG is unset.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Resolve the API server port.
///
/// Priority: --port flag > HEARTMAP_PORT env var > config file value.
pub fn resolve_port(flag: Option<u16>, config_port: u16) -> u16 {
    port_from(flag, std::env::var(PORT_ENV).ok(), config_port)
}

/// Parse a `--mode` value, keeping the configured mode when absent.
pub fn resolve_mode(flag: Option<&str>, config_mode: IngestMode) -> Result<IngestMode, HeartMapError> {
    match flag {
        Some(raw) => raw.parse(),
        None => Ok(config_mode),
    }
}

fn config_path_from(flag: Option<&PathBuf>, env: Option<String>) -> PathBuf {
    if let Some(p) = flag {
        return p.clone();
    }
    match env {
        Some(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

fn port_from(flag: Option<u16>, env: Option<String>, config_port: u16) -> u16 {
    if let Some(p) = flag {
        return p;
    }
    if let Some(p) = env.and_then(|v| v.trim().parse::<u16>().ok()) {
        return p;
    }
    config_port
}
