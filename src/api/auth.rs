//! Authentication endpoints

use axum::{extract::State, Json};

use crate::{
    error::{AppResult, ErrorResponse},
    models::user::{LoginRequest, TokenResponse},
    AppState,
};

use super::{LoginTier, RateLimited};

/// Exchange username and password for a bearer token
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    )
)]
pub async fn login(
    _rate_limit: RateLimited<LoginTier>,
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .services
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(TokenResponse::bearer(token)))
}
