//! Per-client request rate limiting

use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter as KeyedLimiter};

use crate::{
    config::RateLimitConfig,
    error::{AppError, AppResult},
};

/// Idle keys are dropped from every limiter once per this many checks
const PRUNE_EVERY: u64 = 1024;

/// Counter storage behind the rate limiter.
///
/// Implementations must count and compare atomically so concurrent requests
/// for one key are never undercounted.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record one hit for `key`; true while the hits in the current window are within `limit`
    async fn increment_and_check(&self, key: &str, limit: u32, window: Duration) -> AppResult<bool>;
}

/// Process-local GCRA limiters, one per distinct quota. Lost on restart, not shared between instances.
///
/// A key may burst up to `limit` hits, then regains one hit every `window / limit`.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    limiters: Mutex<HashMap<(u32, Duration), Arc<DefaultKeyedRateLimiter<String>>>>,
    checks: AtomicU64,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn limiter(&self, limit: NonZeroU32, window: Duration) -> AppResult<Arc<DefaultKeyedRateLimiter<String>>> {
        let mut limiters = self
            .limiters
            .lock()
            .map_err(|_| AppError::Internal("Rate limit state poisoned".to_string()))?;

        if let Some(limiter) = limiters.get(&(limit.get(), window)) {
            return Ok(limiter.clone());
        }

        let quota = Quota::with_period(window / limit.get())
            .ok_or_else(|| AppError::Internal(format!("Invalid rate limit window: {:?}", window)))?
            .allow_burst(limit);
        let limiter = Arc::new(KeyedLimiter::keyed(quota));
        limiters.insert((limit.get(), window), limiter.clone());
        Ok(limiter)
    }

    fn prune(&self) -> AppResult<()> {
        let limiters = self
            .limiters
            .lock()
            .map_err(|_| AppError::Internal("Rate limit state poisoned".to_string()))?;
        for limiter in limiters.values() {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment_and_check(&self, key: &str, limit: u32, window: Duration) -> AppResult<bool> {
        let Some(limit) = NonZeroU32::new(limit) else {
            return Ok(false);
        };

        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune()?;
        }

        let limiter = self.limiter(limit, window)?;
        Ok(limiter.check_key(&key.to_string()).is_ok())
    }
}

/// Ceiling classes applied per route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    Default,
    Login,
    /// Book mutation and single-book fetch
    Item,
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn limit_for(&self, tier: RateTier) -> u32 {
        match tier {
            RateTier::Default => self.config.default_per_window,
            RateTier::Login => self.config.login_per_window,
            RateTier::Item => self.config.item_per_window,
        }
    }

    /// Count a request from `client` on `route`, failing with 429 once over the tier ceiling
    pub async fn check(&self, tier: RateTier, route: &str, client: &str) -> AppResult<()> {
        let limit = self.limit_for(tier);
        let window = Duration::from_secs(self.config.window_seconds);
        let key = format!("{}|{}", route, client);

        if self.store.increment_and_check(&key, limit, window).await? {
            Ok(())
        } else {
            tracing::warn!(key = %key, limit, "Rate limit exceeded");
            Err(AppError::TooManyRequests(format!(
                "Rate limit exceeded: {} per {} seconds",
                limit, self.config.window_seconds
            )))
        }
    }
}
