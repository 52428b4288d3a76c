//! Login service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::user::AuthUser,
};

use super::{
    credentials::{verify_password, CredentialStore},
    tokens::TokenService,
};

#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(credentials: Arc<dyn CredentialStore>, tokens: TokenService) -> Self {
        Self { credentials, tokens }
    }

    /// Check the credentials and issue a session token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<String> {
        let bad_credentials = || AppError::Authentication("Bad credentials".to_string());

        let Some(credential) = self.credentials.lookup(username) else {
            tracing::warn!(username, "Login failed: unknown user");
            return Err(bad_credentials());
        };

        if !verify_password(&credential.password_hash, password)? {
            tracing::warn!(username, "Login failed: wrong password");
            return Err(bad_credentials());
        }

        let token = self.tokens.issue(username, credential.role)?;
        tracing::info!(username, role = %credential.role, "Login succeeded");
        Ok(token)
    }

    /// Validate a bearer token
    pub fn verify_token(&self, token: &str) -> AppResult<AuthUser> {
        self.tokens.verify(token)
    }
}
