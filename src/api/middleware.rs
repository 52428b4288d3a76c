//! Request gates applied before routing

use axum::{
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct BodyLimit {
    pub max_bytes: u64,
}

/// Reject requests whose declared Content-Length exceeds the limit, before the body is read.
///
/// Missing or non-numeric lengths are let through.
pub async fn limit_body_size(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()));

    if let Some(declared) = declared {
        // All digits but unparsable means it overflowed u64
        let too_large = declared
            .parse::<u64>()
            .map(|len| len > limit.max_bytes)
            .unwrap_or(true);

        if too_large {
            tracing::warn!(content_length = declared, "Request body too large");
            return Err(AppError::PayloadTooLarge("Payload too large".to_string()));
        }
    }

    Ok(next.run(request).await)
}
