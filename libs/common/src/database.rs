//! PostgreSQL pool setup, health checks and the embedded schema

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, str::FromStr, time::Duration};
use tracing::{error, info};

/// Pool settings
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a free connection
    pub acquire_timeout: u64,
    /// Seconds an unused connection is kept open
    pub idle_timeout: u64,
}

impl DatabaseConfig {
    /// Defaults for everything but the URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: 30,
            idle_timeout: 600,
        }
    }

    /// Read the settings from the environment
    ///
    /// `DATABASE_URL` is required. `DATABASE_MAX_CONNECTIONS`,
    /// `DATABASE_MIN_CONNECTIONS`, `DATABASE_CONNECTION_TIMEOUT` and
    /// `DATABASE_IDLE_TIMEOUT` override the defaults from [`DatabaseConfig::new`].
    pub fn from_env() -> DatabaseResult<Self> {
        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| DatabaseError::Configuration("DATABASE_URL is not set".to_string()))?;

        let defaults = Self::new(database_url);
        let config = Self {
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", defaults.min_connections)?,
            acquire_timeout: env_or("DATABASE_CONNECTION_TIMEOUT", defaults.acquire_timeout)?,
            idle_timeout: env_or("DATABASE_IDLE_TIMEOUT", defaults.idle_timeout)?,
            ..defaults
        };

        if config.min_connections > config.max_connections {
            return Err(DatabaseError::Configuration(format!(
                "DATABASE_MIN_CONNECTIONS ({}) exceeds DATABASE_MAX_CONNECTIONS ({})",
                config.min_connections, config.max_connections
            )));
        }

        Ok(config)
    }
}

/// Parse an optional variable, rejecting values that are set but malformed
fn env_or<T: FromStr>(name: &str, default: T) -> DatabaseResult<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            DatabaseError::Configuration(format!("{} has an invalid value: {}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

/// Open the connection pool
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    info!(
        "Connecting to PostgreSQL (max {} connections)",
        config.max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .connect(&config.database_url)
        .await
        .map_err(DatabaseError::Connection)?;

    Ok(pool)
}

/// Check database connectivity
///
/// An unreachable database is reported as `Ok(false)` so the health
/// endpoint can still answer.
pub async fn health_check(pool: &PgPool) -> DatabaseResult<bool> {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => Ok(true),
        Err(e) => {
            error!("Database health check failed: {}", e);
            Ok(false)
        }
    }
}

/// Apply the migrations embedded from `migrations/`
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}
