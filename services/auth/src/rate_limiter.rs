//! Login throttling
//!
//! Each key (the login route uses the normalized email) may fail a limited
//! number of times inside a window. One more attempt after that locks the key
//! out for the ban period. Expired entries are dropped once the table holds
//! `prune_threshold` keys, so unknown emails cannot grow it without bound.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub max_attempts: u32,
    pub window: Duration,
    pub ban: Duration,
    /// Table size at which expired entries are swept before a new key is added
    pub prune_threshold: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(5 * 60),
            ban: Duration::from_secs(15 * 60),
            prune_threshold: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Attempts {
    Counting { count: u32, since: Instant },
    Banned { until: Instant },
}

/// In-memory attempt counter shared across handlers
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: Arc<RateLimiterConfig>,
    attempts: Arc<Mutex<HashMap<String, Attempts>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config: Arc::new(config),
            attempts: Arc::default(),
        }
    }

    /// Count one attempt for `key`; `false` once the key is locked out
    pub async fn is_allowed(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().await;

        let next = match attempts.get(key).copied() {
            Some(Attempts::Banned { until }) if now < until => return false,
            Some(Attempts::Counting { count, since })
                if now.duration_since(since) < self.config.window =>
            {
                if count >= self.config.max_attempts {
                    warn!("Too many attempts for {}, locking out", key);
                    attempts.insert(
                        key.to_string(),
                        Attempts::Banned {
                            until: now + self.config.ban,
                        },
                    );
                    return false;
                }
                Attempts::Counting {
                    count: count + 1,
                    since,
                }
            }
            // Unknown key, expired window or expired ban
            _ => Attempts::Counting {
                count: 1,
                since: now,
            },
        };

        if !attempts.contains_key(key) && attempts.len() >= self.config.prune_threshold {
            let before = attempts.len();
            attempts.retain(|_, entry| !self.is_expired(entry, now));
            debug!("Pruned {} expired login throttle entries", before - attempts.len());
        }

        attempts.insert(key.to_string(), next);
        true
    }

    fn is_expired(&self, entry: &Attempts, now: Instant) -> bool {
        match *entry {
            Attempts::Banned { until } => now >= until,
            Attempts::Counting { since, .. } => now.duration_since(since) >= self.config.window,
        }
    }

    /// Forget `key`, e.g. after a successful login
    pub async fn reset(&self, key: &str) {
        self.attempts.lock().await.remove(key);
    }
}
