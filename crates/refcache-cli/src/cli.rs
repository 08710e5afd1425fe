use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "refcache",
    about = "refcache: normalized, versioned entity cache",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Cache configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a JSON operation script against a fresh cache
    Run(RunArgs),
    /// Print the effective cache configuration
    Config,
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the script: a JSON array of operations
    pub script: PathBuf,
    /// Report failing operations and continue instead of stopping
    #[arg(long)]
    pub keep_going: bool,
    /// Print the cache state after the last operation
    #[arg(long)]
    pub dump: bool,
}
