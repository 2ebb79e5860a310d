//! Server configuration
//!
//! Values come from built-in defaults, overridden by `SERVER_*` environment
//! variables (`SERVER_PORT`, `SERVER_UPLOAD_DIR`, ...).

use anyhow::Result;
use axum::http::HeaderValue;
use config::{Config, Environment};
use serde::Deserialize;

/// HTTP server and upload settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory uploaded asset files are written to
    pub upload_dir: String,
    /// Largest accepted asset upload, in bytes
    pub max_upload_bytes: usize,
    /// Frontend origin allowed by CORS
    pub cors_origin: String,
}

impl ServerConfig {
    /// Load the configuration from defaults and the environment
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001)?
            .set_default("upload_dir", "uploads/assets")?
            .set_default("max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("cors_origin", "http://localhost:3000")?
            .add_source(Environment::with_prefix("SERVER").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than zero");
        }
        if self.upload_dir.trim().is_empty() {
            anyhow::bail!("upload_dir must not be empty");
        }
        HeaderValue::from_str(&self.cors_origin)
            .map_err(|e| anyhow::anyhow!("Invalid cors_origin: {}", e))?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
