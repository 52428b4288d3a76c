//! API handlers for Bookstore REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod middleware;
pub mod openapi;

use std::{marker::PhantomData, net::SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, DefaultBodyLimit, FromRequestParts, MatchedPath},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::user::{AuthUser, Role},
    services::rate_limit::RateTier,
    AppState,
};

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively and must be followed by exactly
/// one space and the token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let invalid = || AppError::Authentication("Invalid authorization header".to_string());

    let mut parts = header.ok_or_else(invalid)?.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(invalid()),
    }
}

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let token = bearer_token(header)?;
        let user = state.services.auth.verify_token(token)?;

        Ok(AuthenticatedUser(user))
    }
}

/// Extractor that additionally requires the admin role
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        user.require_role(Role::Admin)?;
        Ok(AdminUser(user))
    }
}

/// Marker for the rate ceiling a route is subject to
pub trait RateLimitTier {
    const TIER: RateTier;
}

pub struct DefaultTier;
pub struct LoginTier;
pub struct ItemTier;

impl RateLimitTier for DefaultTier {
    const TIER: RateTier = RateTier::Default;
}

impl RateLimitTier for LoginTier {
    const TIER: RateTier = RateTier::Login;
}

impl RateLimitTier for ItemTier {
    const TIER: RateTier = RateTier::Item;
}

/// Rate gate. Place it first in a handler's arguments so it runs before authentication.
///
/// Requests are counted per client IP and per route (method + matched path).
pub struct RateLimited<T>(PhantomData<T>);

#[async_trait]
impl<T> FromRequestParts<AppState> for RateLimited<T>
where
    T: RateLimitTier + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path = parts
            .extensions
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let route = format!("{} {}", parts.method, path);

        let client = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        state.services.rate_limiter.check(T::TIER, &route, &client).await?;
        Ok(RateLimited(PhantomData))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = middleware::BodyLimit {
        max_bytes: state.config.limits.max_body_bytes,
    };

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/token", post(auth::login))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .patch(books::update_book)
                .delete(books::delete_book),
        )
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit.max_bytes).unwrap_or(usize::MAX),
        ))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(axum::middleware::from_fn_with_state(
            body_limit,
            middleware::limit_body_size,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
