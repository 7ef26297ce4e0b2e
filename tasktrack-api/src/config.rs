/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (and a `.env` file, if
/// present) into an immutable [`Config`] that lives behind an `Arc` in the
/// application state.
///
/// # Environment Variables
///
/// - `HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 3000)
/// - `STORAGE_BACKEND`: `postgres` (default) or `memory`
/// - `DATABASE_URL`: PostgreSQL connection string (required for `postgres`)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Session token signing secret, at least 32 characters (required)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: `*`)
/// - `LOG_FORMAT`: `pretty` (default) or `json`
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use tasktrack_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::{env, fmt, str::FromStr};

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Session token configuration
    pub jwt: JwtConfig,

    /// Log output format
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,
}

/// Which storage backend to run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected backend
    pub backend: StorageBackend,

    /// PostgreSQL connection URL (present whenever backend is Postgres)
    pub database_url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Session token configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Signing secret
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unknown LOG_FORMAT '{}' (expected pretty or json)", other),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let backend = var("STORAGE_BACKEND")
            .map(|value| value.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::Postgres);

        let database_url = var("DATABASE_URL");
        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL environment variable is required for the postgres backend");
        }

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a number: {}", e))?;

        let secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LENGTH);
        }

        let log_format = var("LOG_FORMAT")
            .map(|value| value.parse::<LogFormat>())
            .transpose()?
            .unwrap_or(LogFormat::Pretty);

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            storage: StorageConfig {
                backend,
                database_url,
                max_connections,
            },
            jwt: JwtConfig { secret },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
