// voxa server: knowledge, chat and speech endpoints for the widget

use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxa_server::{create_router, AppState, VoxaConfig};

#[derive(Parser)]
#[command(name = "voxa-server")]
#[command(about = "Voice chat widget backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (JSON or TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// HTTP port, overrides file and environment
    #[arg(long, short)]
    port: Option<u16>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => VoxaConfig::from_file(path)?,
        None => VoxaConfig::default(),
    };
    config.apply_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = &cli.log_level {
        config.server.log_level = level.clone();
    }
    config.validate()?;

    init_logging(&config.server.log_level, cli.json_logs);

    let addr = config.socket_addr()?;
    let state = AppState::from_config(&config);
    info!(
        speech = state.synthesizer.is_some(),
        voice_input = state.voice_feed.is_some(),
        ranker = state.store.ranker_name(),
        "Starting voxa server"
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
