//! # Playlog Server
//!
//! Collects organized-play session history for an account, merges it into
//! one record per scenario, and streams job progress to clients.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use playlog_server::{
    infra::{
        config::{
            Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions, StoreConfig,
        },
        startup::build_app_state,
    },
    routes,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "playlog-server")]
#[command(about = "Collects and merges organized-play session history")]
struct Cli {
    /// Path to a playlog.toml configuration file
    #[arg(short, long, env = "PLAYLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Store jobs in this cache directory, ignoring any database URL
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// JSON file of fixture accounts served by the collector
    #[arg(long, env = "PLAYLOG_FIXTURE")]
    fixture: Option<PathBuf>,
}

impl Cli {
    fn apply_overrides(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(root) = self.cache_dir {
            config.store = StoreConfig::Cache { root };
        }
        if let Some(path) = self.fixture {
            config.fixture_path = Some(path);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ConfigLoad {
        mut config,
        warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config.clone(),
        env_file: cli.env_file.clone(),
    })
    .load()
    .context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in &warnings {
        warn!(message = %warning, "configuration warning");
    }
    if config.fixture_path.is_none() {
        warn!("No fixture accounts configured; every job will fail to log in");
    }

    let addr = config.server.bind_address();
    let state = build_app_state(config).await?;
    let router = routes::create_app_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Starting Playlog Server on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped accepting requests; waiting for running jobs");
    state.jobs.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
