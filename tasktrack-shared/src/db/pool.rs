/// PostgreSQL connection pool
///
/// The pool is the only state shared between requests besides the
/// immutable configuration. Nothing is retried here: a failed query surfaces
/// to the handler that ran it.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Pool sizing and timeouts
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Upper bound on open connections
    pub max_connections: u32,

    /// Connections kept open while idle
    pub min_connections: u32,

    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,

    /// Idle connections older than this are closed
    pub idle_timeout: Option<Duration>,

    /// Connections are recycled after this long
    pub max_lifetime: Option<Duration>,
}

impl DatabaseConfig {
    /// Settings for `url` with `max_connections`, other values defaulted
    pub fn new(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections,
            ..Default::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

/// Opens a pool and makes sure the server answers
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await?;

    health_check(&pool).await?;

    info!("PostgreSQL pool ready");
    Ok(pool)
}

/// Round-trips a trivial query
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    debug!(result = one, "Database ping");
    Ok(())
}

/// Waits for checked-out connections to return, then closes the pool
pub async fn close_pool(pool: PgPool) {
    pool.close().await;
    info!("PostgreSQL pool closed");
}
