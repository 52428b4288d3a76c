//! Business logic services

pub mod auth;
pub mod catalog;
pub mod credentials;
pub mod rate_limit;
pub mod redis;
pub mod tokens;

use std::sync::Arc;

use crate::{
    config::{AppConfig, RateLimitBackend},
    error::AppResult,
    repository::Repository,
};

use self::{
    credentials::{CredentialStore, StaticCredentialStore},
    rate_limit::{MemoryRateLimitStore, RateLimitStore, RateLimiter},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub rate_limiter: RateLimiter,
    repository: Repository,
}

impl Services {
    /// Create all services from explicit collaborators
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        credentials: Arc<dyn CredentialStore>,
        rate_limit_store: Arc<dyn RateLimitStore>,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(credentials, tokens::TokenService::new(&config.auth.jwt_secret)),
            catalog: catalog::CatalogService::new(repository.clone()),
            rate_limiter: RateLimiter::new(rate_limit_store, config.rate_limit.clone()),
            repository,
        }
    }

    /// Create all services, building the credential and counter stores the config asks for
    pub async fn from_config(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let credentials = Arc::new(StaticCredentialStore::from_config(&config.auth.users)?);

        let rate_limit_store: Arc<dyn RateLimitStore> = match config.rate_limit.backend {
            RateLimitBackend::Memory => Arc::new(MemoryRateLimitStore::new()),
            RateLimitBackend::Redis => {
                let store = self::redis::RedisRateLimitStore::new(&config.redis.url).await?;
                tracing::info!("Rate limit counters stored in Redis");
                Arc::new(store)
            }
        };

        Ok(Self::new(repository, config, credentials, rate_limit_store))
    }

    /// Database readiness
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
