//! Redis access for short-lived keys such as revoked access tokens

use anyhow::{Context, Result};
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{debug, info};

const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Where to find Redis
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    /// `REDIS_URL`, falling back to a local instance
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        Ok(Self { url })
    }
}

/// Cloneable Redis handle
///
/// Creating it only validates the URL; each operation opens a multiplexed
/// connection when it runs.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .with_context(|| format!("Invalid Redis URL: {}", config.url))?;
        info!("Redis client ready for {}", config.url);
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }

    /// Store `value` under `key`, expiring after `ttl_seconds` when given
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        let mut conn = self.connection().await?;
        match ttl_seconds {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        debug!("Stored key {} (ttl {:?})", key, ttl_seconds);
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        Ok(conn.exists(key).await?)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// `PING` round trip
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(reply == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_url() {
        unsafe {
            std::env::remove_var("REDIS_URL");
        }

        assert_eq!(RedisConfig::from_env().unwrap().url, DEFAULT_REDIS_URL);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let config = RedisConfig {
            url: "not a redis url".to_string(),
        };
        assert!(RedisPool::new(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_operations_fail_when_unreachable() {
        let pool = RedisPool::new(&RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
        })
        .await
        .unwrap();

        assert!(pool.exists("revoked_token:missing").await.is_err());
        assert!(pool.health_check().await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_set_get_exists_delete() -> Result<()> {
        let pool = RedisPool::new(&RedisConfig::from_env()?).await?;

        let key = "asset_cache_test_key";
        pool.set(key, "value", Some(5)).await?;
        assert_eq!(pool.get(key).await?, Some("value".to_string()));
        assert!(pool.exists(key).await?);

        pool.delete(key).await?;
        assert_eq!(pool.get(key).await?, None);
        assert!(!pool.exists(key).await?);

        Ok(())
    }
}
