//! tubeproxy server binary
//!
//! Loads configuration, starts the janitor and serves the REST API until
//! SIGINT/SIGTERM, then shuts the orchestrator down gracefully.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tubeproxy::{Config, Downloader};

/// Video download proxy with asynchronous job tracking
#[derive(Debug, Parser)]
#[command(name = "tubeproxy", version, about)]
struct Cli {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long, env = "TUBEPROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding `server.bind_address`
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Download directory, overriding `jobs.download_dir`
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tubeproxy=debug,tower_http=info".into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(dir) = cli.download_dir {
        config.jobs.download_dir = dir;
    }

    let downloader = Arc::new(Downloader::new(config).await?);
    let config = downloader.get_config();
    tracing::info!(
        backend = %downloader.capabilities().backend,
        download_dir = %config.jobs.download_dir.display(),
        "tubeproxy starting"
    );

    let janitor = downloader.start_janitor();

    let served = tubeproxy::api::start_api_server_with_shutdown(
        downloader.clone(),
        config,
        tubeproxy::wait_for_signal(),
    )
    .await;

    downloader.shutdown().await;
    if let Err(e) = janitor.await {
        tracing::warn!(error = %e, "janitor task ended abnormally");
    }

    served?;
    Ok(())
}
