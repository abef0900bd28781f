// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tangle Store Node
//!
//! Entry point for the `tangle-store-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and serves the HTTP API.
//!
//! The binary supports five subcommands:
//!
//! - `run`     — serve the store API and the metrics endpoint
//! - `init`    — write a sample configuration file
//! - `store`   — store one local file without starting a server
//! - `status`  — query a running service's health endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use tangle_store::config::{IOTA_API_VERSION, IPFS_REQUEST_TIMEOUT, NODE_REQUEST_TIMEOUT};
use tangle_store::crypto::sha256_hex;
use tangle_store::ipfs::IpfsHttpClient;
use tangle_store::tangle::NodeClient;
use tangle_store::{StoreConfig, StoreRequest, StoreRequestHandler};

use cli::{Commands, TangleStoreCli};
use logging::LogFormat;
use metrics::StoreMetrics;

/// Timeout for the `status` subcommand's health probe.
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

type HttpStoreHandler = StoreRequestHandler<NodeClient, IpfsHttpClient>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TangleStoreCli::parse();
    logging::init_logging(
        logging::DEFAULT_LOG_LEVEL,
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Init(args) => init_config(args),
        Commands::Store(args) => store_file(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads the configuration file and applies the seed override, if any.
fn load_config(args: &cli::ConfigArgs) -> Result<StoreConfig> {
    let mut config = StoreConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    if let Some(seed) = &args.seed {
        config = config
            .with_seed(seed.clone())
            .context("seed override rejected")?;
    }
    tracing::debug!(config = ?config, "configuration loaded");
    Ok(config)
}

/// Wires the HTTP ledger and storage clients into a store handler.
fn build_handler(config: Arc<StoreConfig>) -> Result<HttpStoreHandler> {
    let ledger = NodeClient::new(config.node.provider.clone(), NODE_REQUEST_TIMEOUT)
        .context("failed to build ledger node client")?;
    let storage =
        IpfsHttpClient::new(IPFS_REQUEST_TIMEOUT).context("failed to build IPFS client")?;
    Ok(StoreRequestHandler::new(config, ledger, storage))
}

/// Serves the store API and the metrics endpoint until a shutdown signal.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    let config = Arc::new(load_config(&args.config)?);
    tracing::info!(
        node = %config.node.provider,
        ipfs = %config.ipfs.provider,
        depth = config.node.depth,
        mwm = config.node.mwm,
        "starting tangle-store-node v{}",
        env!("CARGO_PKG_VERSION")
    );

    let handler = build_handler(Arc::clone(&config))?;
    let store_metrics =
        Arc::new(StoreMetrics::new().context("failed to register Prometheus metrics")?);

    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        config,
        store: Arc::new(handler),
        metrics: Arc::clone(&store_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.bind, args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(store_metrics);
    let metrics_addr = format!("{}:{}", args.bind, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("tangle-store-node stopped");
    Ok(())
}

/// Writes a sample configuration file.
fn init_config(args: cli::InitArgs) -> Result<()> {
    let path = &args.config;
    if path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }

    let sample = StoreConfig::sample()
        .to_toml_string()
        .context("failed to render sample config")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, sample)
        .with_context(|| format!("failed to write config to {}", path.display()))?;

    tracing::info!(path = %path.display(), "sample configuration written");

    println!("Configuration written to {}", path.display());
    println!("  Replace the placeholder seed, or set TANGLE_STORE_SEED.");
    println!("  Set ipfs.token if your IPFS provider requires authentication.");

    Ok(())
}

/// Runs the store pipeline once for a local file and prints the response.
async fn store_file(args: cli::StoreArgs) -> Result<()> {
    let config = Arc::new(load_config(&args.config)?);
    let handler = build_handler(config)?;

    let request = request_from_file(&args.file, &args.description)?;
    let response = handler.handle(&request).await;

    let rendered =
        serde_json::to_string_pretty(&response).context("failed to render response")?;
    println!("{}", rendered);

    if !response.success {
        anyhow::bail!("storing {} failed", args.file.display());
    }
    Ok(())
}

/// Builds a store request from a file on disk.
fn request_from_file(path: &std::path::Path, description: &str) -> Result<StoreRequest> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;

    let modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(StoreRequest::new(
        name,
        description,
        data.len() as u64,
        modified.to_rfc3339(),
        sha256_hex(&data),
        STANDARD.encode(&data),
    ))
}

/// Queries a running service's health endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(STATUS_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed to read response from {}", url))?;

    println!("{}", body);
    if !status.is_success() {
        anyhow::bail!("{} answered {}", url, status);
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("tangle-store-node {}", env!("CARGO_PKG_VERSION"));
    println!("iri api           {}", IOTA_API_VERSION);
    println!("rustc             {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed that branch never completes; the
/// other one still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
