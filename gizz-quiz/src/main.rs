//! gizz-quiz - discography quiz service
//!
//! Serves trivia and name-that-tune quizzes over HTTP, with quiz events
//! streamed to the presentation over SSE.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gizz_common::config::{CONFIG_ENV_VAR, PORT_ENV_VAR};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gizz_quiz::services::{HttpJsonSource, IntervalTicks};

/// Command-line arguments for gizz-quiz
#[derive(Parser, Debug)]
#[command(name = "gizz-quiz")]
#[command(about = "Discography trivia and name-that-tune quiz service")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = PORT_ENV_VAR)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = gizz_quiz::config::resolve_service_config(args.config.as_deref(), args.port)
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| gizz_quiz::config::default_log_filter(&config).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gizz-quiz");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        catalog = %config.catalog.base_url,
        artist = %config.catalog.artist_name,
        "Catalog source"
    );

    let source = Arc::new(
        HttpJsonSource::new(&config.http).context("Failed to build HTTP client")?,
    );
    let state = gizz_quiz::build_engine(
        &config,
        source,
        Arc::new(IntervalTicks::every_second()),
        StdRng::from_entropy(),
    );
    let app = gizz_quiz::build_router(state);

    let addr = gizz_quiz::config::listen_addr(&config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
