//! Waitlist service - Entry point.

use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use waitlist_server::{
    api::{create_router, AppState},
    config::Config,
    WaitlistService,
};
use waitlist_store::{FileStore, MemoryStore, WaitlistStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.log.level);

    info!("Starting waitlist service");

    let store: Arc<dyn WaitlistStore> = if config.store.persist {
        let store = FileStore::open(&config.store.path)
            .await
            .with_context(|| format!("Failed to open waitlist at {:?}", config.store.path))?;
        Arc::new(store)
    } else {
        info!("Persistence disabled, using in-memory storage");
        Arc::new(MemoryStore::new())
    };

    let service = WaitlistService::new(store, config.waitlist.clone());
    let app = create_router(AppState::new(service));

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse::<IpAddr>()
            .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?,
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Waitlist service stopped");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
