use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use api::{AppState, config::ServerConfig, routes};
use auth::{
    AuthState,
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig, init_pool, run_migrations},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting API service");

    let server_config = ServerConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    let auth_state = AuthState {
        user_repository: UserRepository::new(pool.clone()),
        jwt_service,
        redis_pool,
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
    };

    tokio::fs::create_dir_all(&server_config.upload_dir).await?;

    let bind_address = server_config.bind_address();
    let app = routes::create_router(AppState::new(pool, auth_state, server_config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("API service listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
