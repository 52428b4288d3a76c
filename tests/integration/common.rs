//! Shared helpers for integration tests

use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tower::ServiceExt;

use bookstore_server::{
    api,
    config::{AppConfig, DatabaseConfig},
    models::user::Role,
    repository::Repository,
    services::{
        credentials::{hash_password, StaticCredentialStore},
        rate_limit::MemoryRateLimitStore,
        Services,
    },
    AppState,
};

pub const DEFAULT_CLIENT: [u8; 4] = [127, 0, 0, 1];

/// Hashed once per test binary; argon2 is slow in debug builds
static CREDENTIALS: Lazy<Arc<StaticCredentialStore>> = Lazy::new(|| {
    let hash = hash_password("password").expect("hash password");
    Arc::new(
        StaticCredentialStore::new()
            .with_user("admin", hash.clone(), Role::Admin)
            .with_user("user", hash, Role::User),
    )
});

pub struct TestApp {
    router: Router,
}

/// App with rate ceilings high enough to stay out of the way
pub async fn spawn_app() -> TestApp {
    let mut config = AppConfig::default();
    config.rate_limit.default_per_window = 1_000;
    config.rate_limit.login_per_window = 1_000;
    config.rate_limit.item_per_window = 1_000;
    spawn_app_with(config).await
}

pub async fn spawn_app_with(mut config: AppConfig) -> TestApp {
    config.database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };

    let pool = Repository::connect(&config.database).await.expect("connect database");
    let repository = Repository::new(pool);
    repository.migrate().await.expect("run migrations");

    let services = Services::new(
        repository,
        &config,
        CREDENTIALS.clone(),
        Arc::new(MemoryRateLimitStore::new()),
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    TestApp {
        router: api::create_router(state),
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("send request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub fn build(client: [u8; 4], method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let mut request = builder.body(body).expect("build request");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((client, 40_000))));
        request
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.send(Self::build(DEFAULT_CLIENT, method, uri, token, body)).await
    }

    pub async fn request_from(&self, client: [u8; 4], method: &str, uri: &str) -> (StatusCode, Value) {
        self.send(Self::build(client, method, uri, None, None)).await
    }

    pub async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/auth/token",
                None,
                Some(json!({ "username": username, "password": "password" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().expect("access_token").to_string()
    }

    pub async fn create_book(&self, token: &str, book: Value) -> Value {
        let (status, body) = self.request("POST", "/books", Some(token), Some(book)).await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body
    }
}
