use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "triage-server")]
#[command(
    author,
    version,
    about = "Issue classification service with correction tracking"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TRIAGE_CONFIG", default_value = "triage.yaml")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long, env = "TRIAGE_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "TRIAGE_PORT")]
    pub port: Option<u16>,

    /// SQLite database path (`:memory:` for a throwaway store)
    #[arg(short, long, env = "TRIAGE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory of a pre-trained linear model; replaces the configured classifier
    #[arg(short, long, env = "TRIAGE_MODEL")]
    pub model: Option<PathBuf>,

    /// Drop all stored predictions at startup
    #[arg(long)]
    pub reset_storage: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
