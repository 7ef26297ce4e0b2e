//! # TaskTrack API Server
//!
//! Multi-user task tracking backend. Users register, log in for a session
//! token, manage their profile through `/users/me` and keep a private task
//! list under `/tasks`.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) STORAGE_BACKEND=memory cargo run -p tasktrack-api
//! ```

use std::sync::Arc;

use tasktrack_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StorageBackend},
};
use tasktrack_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::{MemoryStore, PgStore, SharedStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "tasktrack_api=debug,tasktrack_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!(
        "TaskTrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let (store, pool) = match config.storage.backend {
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;

            ensure_database_exists(&url).await?;

            let pool =
                create_pool(&DatabaseConfig::new(url, config.storage.max_connections)).await?;

            run_migrations(&pool).await?;

            let store: SharedStore = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let store: SharedStore = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
