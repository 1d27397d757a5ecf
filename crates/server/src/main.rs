// ABOUTME: reelfeed-server binary: loads configuration, initialises logging, serves the feed API.
// ABOUTME: REELFEED_API_KEY overrides the configured remote API key.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use reelfeed_server::{build_router, AppState, ServerConfig, SourceConfig};
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "reelfeed-server")]
#[command(about = "Serve paged video feed items over HTTP", long_about = None)]
struct Args {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve this static JSON collection instead of the configured source.
    #[arg(long = "static", value_name = "FILE")]
    static_path: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if args.verbose {
            "reelfeed_server=debug,reelfeed_feed=debug,reelfeed_client=debug,tower_http=debug".to_string()
        } else {
            "reelfeed_server=info,reelfeed_feed=info,reelfeed_client=info,tower_http=info".to_string()
        }
    });
    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    let mut config = ServerConfig::load_or_default(args.config.as_deref());
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = args.static_path {
        config.source = SourceConfig::Static { path };
    }
    if let SourceConfig::Remote { api_key, .. } = &mut config.source {
        if let Ok(key) = std::env::var("REELFEED_API_KEY") {
            *api_key = Some(key);
        }
    }

    for warning in config.validate() {
        tracing::warn!("config: {warning}");
    }

    let state = AppState::from_config(&config);
    if let Some(client) = state.remote_client() {
        client.cache().spawn_sweeper(config.cache_ttl);
    }

    let app = build_router(state);
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
