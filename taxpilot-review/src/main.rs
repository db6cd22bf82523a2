//! taxpilot-review - Reviewer service
//!
//! Serves the review queue to licensed reviewers: list flagged items and
//! record dispositions. Reads the SQLite database shared with
//! taxpilot-agent.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxpilot_common::config::TaxpilotConfig;
use taxpilot_common::db::{init_database, SqliteReviewStore};
use taxpilot_review::{build_router, AppState};

/// Command-line arguments for taxpilot-review
#[derive(Parser, Debug)]
#[command(name = "taxpilot-review")]
#[command(about = "Human review service for TaxPilot")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "TAXPILOT_REVIEW_PORT")]
    port: Option<u16>,

    /// SQLite database file shared with taxpilot-agent
    #[arg(short, long, env = "TAXPILOT_DB")]
    database: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxpilot_review=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting TaxPilot Review v{}", env!("CARGO_PKG_VERSION"));

    let mut config = TaxpilotConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.review_port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(Arc::new(SqliteReviewStore::new(pool)));
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.review_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("taxpilot-review listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown on ctrl-c / SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
