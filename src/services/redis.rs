//! Redis-backed rate limit counters, shared by every server instance

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::Client;

use crate::error::{AppError, AppResult};

use super::rate_limit::RateLimitStore;

#[derive(Clone)]
pub struct RedisRateLimitStore {
    client: Client,
}

impl RedisRateLimitStore {
    /// Create a new Redis store and check the server answers
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment_and_check(&self, key: &str, limit: u32, window: Duration) -> AppResult<bool> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        let window_secs = window.as_secs().max(1) as i64;
        // Windows are aligned on epoch multiples so every instance agrees on the bucket
        let bucket = format!("ratelimit:{}:{}", key, Utc::now().timestamp() / window_secs);

        // INCR and EXPIRE run in one MULTI so a counted bucket always carries a TTL
        let (hits, _): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&bucket)
            .cmd("EXPIRE")
            .arg(&bucket)
            .arg(window_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count request in Redis: {}", e)))?;

        Ok(hits <= i64::from(limit))
    }
}
