//! REST API server for blog posts and categories.
//!
//! Integrates the core store, the runtime loop, and the REST API with
//! configuration parsing, fixture seeding, and graceful shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use blog_api::{router::Router, server::Server};
use blog_core::config::BlogConfig;
use blog_core::fixtures::Fixtures;
use blog_core::persistence::PersistenceManager;
use blog_core::Database;
use blog_runtime::Runtime;

/// Command-line arguments for the blog server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Tick rate for runtime loop (Hz)
    #[arg(long, default_value_t = 60)]
    tickrate: u32,

    /// Data directory for snapshots; the store is memory-only when omitted
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Fixture file to seed the store with when no snapshot exists
    #[arg(long, conflicts_with = "seed_builtin")]
    fixtures: Option<PathBuf>,

    /// Seed the built-in sample posts and categories when no snapshot exists
    #[arg(long)]
    seed_builtin: bool,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 10000)]
    response_timeout_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = BlogConfig {
        tickrate: args.tickrate,
        data_dir: args.data_dir.clone(),
        request_timeout_ms: args.request_timeout_ms,
        response_timeout_ms: args.response_timeout_ms,
        ..Default::default()
    };
    config.validate()?;

    let persistence = PersistenceManager::from_config(&config);
    let db = Arc::new(open_database(&args, persistence.as_ref())?);

    let (api_tx, api_rx) = mpsc::channel(config.queue_capacity());
    let runtime = Runtime::new(db, config.clone(), api_rx, persistence)
        .spawn()
        .context("Failed to spawn runtime thread")?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    tracing::info!(
        "Starting blog server on {} ({} Hz, persistence {})",
        addr,
        config.tickrate,
        if config.persistence_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let router = Router::new(Arc::new(config), api_tx)?;

    Server::new(addr, router)
        .serve_with_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl_c: {}", e);
            }
        })
        .await?;

    // The router is gone, so the runtime drains its queue, flushes, and exits.
    let outcome = tokio::task::spawn_blocking(move || runtime.join())
        .await?
        .map_err(|_| anyhow::anyhow!("Runtime thread panicked"))?;
    outcome.context("Runtime stopped with an error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Loads the last snapshot, or seeds a fresh store from fixtures.
fn open_database(
    args: &Args,
    persistence: Option<&PersistenceManager>,
) -> anyhow::Result<Database> {
    if let Some(persistence) = persistence {
        if let Some(db) = persistence
            .load_database()
            .context("Failed to load snapshot")?
        {
            tracing::info!(
                "Loaded snapshot from {}",
                persistence.data_dir().display()
            );
            return Ok(db);
        }
    }

    let fixtures = match (&args.fixtures, args.seed_builtin) {
        (Some(path), _) => Some(
            Fixtures::load(path)
                .with_context(|| format!("Failed to load fixtures from {}", path.display()))?,
        ),
        (None, true) => Some(Fixtures::builtin()?),
        (None, false) => None,
    };

    let db = Database::new();
    if let Some(fixtures) = fixtures {
        db.seed(&fixtures)?;
        if let Some(persistence) = persistence {
            persistence.save_snapshot(&db)?;
        }
    }
    Ok(db)
}
