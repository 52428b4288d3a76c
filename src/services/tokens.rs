//! Signed session tokens (HS256 JWT)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    error::{AppError, AppResult},
    models::user::{AuthUser, Role, TokenClaims},
};

/// Lifetime of an issued token. Tokens cannot be revoked before expiry.
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::minutes(ACCESS_TOKEN_TTL_MINUTES))
    }

    fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Create a token for `subject` expiring one TTL from now
    pub fn issue(&self, subject: &str, role: Role) -> AppResult<String> {
        let claims = TokenClaims {
            sub: subject.to_string(),
            role,
            exp: (Utc::now() + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Check signature, structure and expiry, then rebuild the user
    pub fn verify(&self, token: &str) -> AppResult<AuthUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.into())
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                AppError::Authentication("Invalid or expired token".to_string())
            })
    }
}
