//! Redis-backed token store
//!
//! Lets several bot processes share one token instead of each acquiring its
//! own. Read failures are reported as absent and write failures are dropped
//! with a warning: token absence always triggers a fresh acquisition
//! upstream, so an unreachable cache degrades to per-process tokens rather
//! than failing calls.

use std::time::Duration;

use async_trait::async_trait;
use fred::prelude::*;
use tracing::warn;

use crate::config::TOKEN_REFRESH_MARGIN;
use crate::error::{Error, Result};
use crate::token::store::TokenStore;

/// Token store backed by a shared Redis instance.
pub struct RedisStore {
    client: Client,
    refresh_margin: Duration,
}

impl RedisStore {
    /// Connect to Redis at `redis_url` with the default refresh margin.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        Self::connect_with_margin(redis_url, TOKEN_REFRESH_MARGIN).await
    }

    /// Connect to Redis at `redis_url` with an explicit refresh margin.
    pub async fn connect_with_margin(redis_url: &str, refresh_margin: Duration) -> Result<Self> {
        let config = Config::from_url(redis_url).map_err(|e| Error::Store(e.to_string()))?;
        let client = Client::new(config, None, None, None);
        client.connect();
        client
            .wait_for_connect()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        Ok(Self {
            client,
            refresh_margin,
        })
    }
}

#[async_trait]
impl TokenStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let effective = ttl.saturating_sub(self.refresh_margin);
        if effective.is_zero() {
            return;
        }
        let result: std::result::Result<(), fred::error::Error> = self
            .client
            .set(
                key,
                value,
                Some(Expiration::EX(effective.as_secs() as i64)),
                None,
                false,
            )
            .await;
        if let Err(e) = result {
            // The next get will report absent and trigger re-acquisition.
            warn!(key, error = %e, "Failed to store token in Redis");
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        match self.client.get::<Option<String>, _>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Redis read failed, treating token as absent");
                None
            }
        }
    }
}
