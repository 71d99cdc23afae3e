use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use vantage::api;
use vantage::config::{Config, DatabaseBackend};
use vantage::query::{PostgresStore, SqliteStore, StatsRepo};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize the stats store
    let repo: Arc<dyn StatsRepo> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite store: {}", config.database.url);
            Arc::new(
                SqliteStore::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL store: {}", config.database.url);
            Arc::new(
                PostgresStore::new(&config.database.url, config.database.max_connections).await?,
            )
        }
    };

    // Initialize database
    info!("Initializing database...");
    repo.init().await?;
    info!("Database initialized successfully");

    // Create router
    let router = api::create_api_router(Arc::clone(&repo), config.report.clone());

    // Start API server
    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 API server listening on http://{}", addr);
    info!("   - Stats endpoint at http://{}/api/websites/{{id}}/stats", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
