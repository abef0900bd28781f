//! # CLI Interface
//!
//! Defines the command-line argument structure for `tangle-store-node`
//! using `clap` derive. Supports five subcommands: `run`, `init`, `store`,
//! `status`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tangle_store::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

/// Tangle store service.
///
/// Accepts small files over HTTP, uploads them to IPFS, and records their
/// metadata and content identifier on the IOTA Tangle.
#[derive(Parser, Debug)]
#[command(
    name = "tangle-store-node",
    about = "Store files on IPFS and anchor them on the IOTA Tangle",
    version,
    propagate_version = true
)]
pub struct TangleStoreCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "TANGLE_STORE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API and the metrics endpoint.
    Run(RunArgs),
    /// Write a sample configuration file.
    Init(InitArgs),
    /// Store one local file and print the JSON response.
    Store(StoreArgs),
    /// Query the health of a running service.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Configuration source shared by `run` and `store`.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Path to the configuration file (TOML).
    #[arg(long, short = 'c', env = "TANGLE_STORE_CONFIG", default_value = "tangle-store.toml")]
    pub config: PathBuf,

    /// Seed override. Takes precedence over the seed in the config file.
    ///
    /// Prefer the environment variable; flags end up in shell history.
    #[arg(long, env = "TANGLE_STORE_SEED", hide_env_values = true)]
    pub seed: Option<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Address to bind both listeners to.
    #[arg(long, env = "TANGLE_STORE_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port for the HTTP API.
    #[arg(long, env = "TANGLE_STORE_PORT", default_value_t = DEFAULT_API_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "TANGLE_STORE_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the sample configuration.
    #[arg(long, short = 'c', env = "TANGLE_STORE_CONFIG", default_value = "tangle-store.toml")]
    pub config: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `store` subcommand.
#[derive(Parser, Debug)]
pub struct StoreArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// File to store.
    pub file: PathBuf,

    /// Description recorded with the file.
    #[arg(long, short = 'm', default_value = "stored from the command line")]
    pub description: String,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Base URL of the running service.
    #[arg(long, default_value = "http://127.0.0.1:4000")]
    pub url: String,
}
