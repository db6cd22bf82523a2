//! taxpilot-agent - Conversational tax-filing agent service
//!
//! Serves the chat, session, tax-return, and upload APIs. Sessions and
//! review items persist to the SQLite database shared with
//! taxpilot-review.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxpilot_agent::extract::FixtureExtractor;
use taxpilot_agent::remote::RemoteAgentClient;
use taxpilot_agent::sessions::SessionManager;
use taxpilot_agent::{build_router, AppState};
use taxpilot_common::config::TaxpilotConfig;
use taxpilot_common::db::{init_database, SqliteReviewStore, SqliteSessionStore};

/// Command-line arguments for taxpilot-agent
#[derive(Parser, Debug)]
#[command(name = "taxpilot-agent")]
#[command(about = "Conversational tax-filing agent for TaxPilot")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "TAXPILOT_AGENT_PORT")]
    port: Option<u16>,

    /// SQLite database file shared with taxpilot-review
    #[arg(short, long, env = "TAXPILOT_DB")]
    database: Option<PathBuf>,

    /// Base URL of the optional remote reasoning agent
    #[arg(long, env = "TAXPILOT_REMOTE_URL")]
    remote_url: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxpilot_agent=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting TaxPilot Agent v{}", env!("CARGO_PKG_VERSION"));

    let mut config = TaxpilotConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.agent_port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if args.remote_url.is_some() {
        config.remote_url = args.remote_url;
    }

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let manager = Arc::new(SessionManager::new(
        Arc::new(SqliteSessionStore::new(pool.clone())),
        Arc::new(SqliteReviewStore::new(pool)),
    ));

    let remote = match &config.remote_url {
        Some(url) => {
            info!("Remote reasoning agent configured: {}", url);
            Some(Arc::new(
                RemoteAgentClient::new(
                    url.clone(),
                    Duration::from_secs(config.remote_timeout_secs),
                )
                .context("Failed to build remote agent client")?,
            ))
        }
        None => {
            warn!("No remote reasoning agent configured; using local responder only");
            None
        }
    };

    let state = AppState::new(manager, Arc::new(FixtureExtractor::new()), remote);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.agent_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("taxpilot-agent listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
