mod config;
mod db;
mod errors;
mod models;
mod profile;
mod query;
mod routes;
mod seed;
mod state;
mod store;

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::routes::build_app;
use crate::state::AppState;
use crate::store::PgProfileStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    // One pool for the lifetime of the process, shared by every request.
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    ensure_schema(&pool).await?;
    let store = Arc::new(PgProfileStore::new(pool));

    // `portfolio-api seed [path]`
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("seed") {
        let path = args
            .get(2)
            .map(PathBuf::from)
            .unwrap_or_else(|| config.seed_file.clone());
        seed::seed_profile(store.as_ref(), &path).await?;
        return Ok(());
    }

    let app = build_app(AppState::new(store), &config);

    let listener = bind_with_retry(config.port, config.port_retry_attempts).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Binds `port`, moving to the next port while the address is taken.
async fn bind_with_retry(port: u16, attempts: u16) -> Result<TcpListener> {
    let mut port = port;
    let mut remaining = attempts;
    loop {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse && remaining > 0 && port < u16::MAX => {
                warn!("Port {port} in use, trying {}...", port + 1);
                port += 1;
                remaining -= 1;
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
