//! Tournament server.
//!
//! Serves the bracket, round-robin and registration API over HTTP, backed
//! by either the in-memory or the PostgreSQL document store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use pico_args::Arguments;
use tourney::{DocumentStore, MemoryStore, PgDocumentStore, TournamentManager};
use tourney_server::{
    api,
    config::{ServerConfig, StoreBackend},
    logging, metrics,
};
use tracing::{info, warn};

const HELP: &str = "\
Run the tournament server

USAGE:
  tourney_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --backend    NAME        Document store: memory or postgres  [default: env STORE_BACKEND or memory]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  STORE_BACKEND            memory or postgres
  DATABASE_URL             PostgreSQL connection string
  METRICS_BIND             Prometheus exporter address (e.g., 0.0.0.0:9090)
  TX_MAX_ATTEMPTS          Transaction attempts before giving up
  TX_BACKOFF_MS            Base transaction retry backoff
  POINTS_PER_WIN           Round-robin points for a win
  BRACKET_SEED             Fixed bracket shuffle seed
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let backend: Option<StoreBackend> = pargs.opt_value_from_str("--backend")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    let config = ServerConfig::from_env(bind, backend, database_url)?;
    config.validate()?;

    logging::init();
    info!(bind = %config.bind, backend = %config.backend, "Starting tournament server");

    if let Some(addr) = config.metrics_bind {
        match metrics::init_metrics(addr) {
            Ok(()) => info!(%addr, "Prometheus exporter listening"),
            Err(e) => warn!(error = %e, "Metrics disabled"),
        }
    }

    let (store, postgres): (Arc<dyn DocumentStore>, Option<PgDocumentStore>) = match config.backend
    {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; tournaments are lost on restart");
            (Arc::new(MemoryStore::new()), None)
        }
        StoreBackend::Postgres => {
            let store = PgDocumentStore::connect(&config.database)
                .await
                .context("Failed to connect to database")?;
            store
                .migrate()
                .await
                .context("Failed to create document tables")?;
            info!("Database connected successfully");
            (Arc::new(store.clone()), Some(store))
        }
    };

    let manager = TournamentManager::with_config(store, config.engine);

    let state = api::AppState {
        manager: Arc::new(manager),
        backend: config.backend,
        postgres,
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
}
