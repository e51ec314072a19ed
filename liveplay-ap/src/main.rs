//! LivePlay Audio Player (liveplay-ap) - Main entry point
//!
//! Loads the configured project, starts the cue engine task and serves the
//! HTTP/SSE control surface until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liveplay_ap::api::{self, AppContext};
use liveplay_ap::config::{CliOverrides, Config};
use liveplay_ap::library::ProjectLibrary;
use liveplay_ap::playback::{
    spawn_engine, ClockTransport, CueEngine, HttpActionDispatcher, RuntimeOptions,
};
use liveplay_ap::SharedState;

/// Command-line arguments for liveplay-ap
#[derive(Parser, Debug)]
#[command(name = "liveplay-ap")]
#[command(about = "Cue playback engine for LivePlay")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "LIVEPLAY_PORT")]
    port: Option<u16>,

    /// Project file (.liveplay) to open at startup
    #[arg(short = 'P', long, env = "LIVEPLAY_PROJECT")]
    project: Option<PathBuf>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drive playback from the engine clock without an audio device
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cli = CliOverrides {
        port: args.port,
        project: args.project.clone(),
        dry_run: args.dry_run,
    };
    let config = Config::load(&cli, args.config.as_deref()).context("Invalid configuration")?;

    // Initialize tracing (RUST_LOG wins over the config file)
    let default_filter = if config.log_level == "info" {
        "liveplay_ap=info,tower_http=info".to_string()
    } else {
        config.log_level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting LivePlay Audio Player v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.port
    );

    let library = match &config.project {
        Some(path) => Arc::new(
            ProjectLibrary::open(path)
                .with_context(|| format!("Failed to open project {}", path.display()))?,
        ),
        None => {
            info!("No project given, starting empty");
            Arc::new(ProjectLibrary::empty())
        }
    };

    if !config.dry_run {
        warn!("No audio device transport is built in; using the clock transport");
    }
    let transport = ClockTransport::with_curve(config.fade_curve);
    let actions = HttpActionDispatcher::new(config.http_action_timeout)
        .context("Failed to build HTTP client for custom actions")?;

    let engine = CueEngine::new(library.clone(), Box::new(transport), Box::new(actions));
    let state = Arc::new(SharedState::new());
    let (handle, engine_task) = spawn_engine(
        engine,
        state.clone(),
        RuntimeOptions::with_inspector_ms(config.inspector_interval_ms),
    );
    info!("Cue engine started");

    let ctx = AppContext {
        state,
        engine: handle,
        library,
    };

    api::run(config.port, ctx, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Router (and with it the last engine handle) is gone; let the task end
    if let Err(e) = engine_task.await {
        warn!("Engine task ended abnormally: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
