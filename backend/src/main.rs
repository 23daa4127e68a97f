//! Kitchen Stock - Backend Server
//!
//! Sale-driven ingredient consumption and replenishment for small kitchens.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ks_server::{
    config::{Config, StoreBackend},
    create_app,
    services::notification::notifier_from_config,
    store::{InventoryStore, MemoryStore, PgStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ks_server=debug,tower_http=debug,sqlx=warn".into());
    let json = std::env::var("KS_LOG_FORMAT").map_or(false, |f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    tracing::info!("Starting Kitchen Stock Server");
    tracing::info!("Environment: {}", config.environment);

    let store: Arc<dyn InventoryStore> = match config.store.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await
                .context("failed to connect to database")?;
            tracing::info!("Database connection established");

            let store = PgStore::new(db_pool);

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(store.pool()).await?;
                tracing::info!("Migrations completed");
            }

            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier = notifier_from_config(&config.notification)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    // Create application state and router
    let app = create_app(AppState::new(store, notifier, config));

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
