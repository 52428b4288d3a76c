//! Credential lookup for login

use std::collections::HashMap;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::UserAccountConfig,
    error::{AppError, AppResult},
    models::user::Role,
};

/// Stored secret and role of one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Argon2 PHC string
    pub password_hash: String,
    pub role: Role,
}

/// Source of login accounts
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, username: &str) -> Option<Credential>;
}

/// Fixed set of accounts loaded once at startup
#[derive(Debug, Default, Clone)]
pub struct StaticCredentialStore {
    users: HashMap<String, Credential>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: impl Into<String>, password_hash: String, role: Role) -> Self {
        self.users.insert(username.into(), Credential { password_hash, role });
        self
    }

    /// Build the store from `auth.users`, hashing plaintext passwords
    pub fn from_config(accounts: &[UserAccountConfig]) -> AppResult<Self> {
        let mut store = Self::new();
        for account in accounts {
            let password_hash = match (&account.password_hash, &account.password) {
                (Some(hash), _) => {
                    PasswordHash::new(hash).map_err(|e| {
                        AppError::Internal(format!(
                            "Invalid password hash for user {}: {}",
                            account.username, e
                        ))
                    })?;
                    hash.clone()
                }
                (None, Some(password)) => hash_password(password)?,
                (None, None) => {
                    return Err(AppError::Internal(format!(
                        "User {} has neither password nor password_hash",
                        account.username
                    )))
                }
            };
            store = store.with_user(account.username.clone(), password_hash, account.role);
        }
        tracing::info!("Loaded {} login account(s)", store.users.len());
        Ok(store)
    }
}

impl CredentialStore for StaticCredentialStore {
    fn lookup(&self, username: &str) -> Option<Credential> {
        self.users.get(username).cloned()
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check `password` against an Argon2 PHC string
pub fn verify_password(password_hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
