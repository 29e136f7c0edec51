//! User management service — application-layer orchestration
//!
//! Registration and login for the auth service. HTTP handlers are thin
//! wrappers that delegate here.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{
    DomainError, DomainResult, IdAllocator, InfraError, User, UserRepositoryInterface,
};
use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password};

pub const MAX_USERNAME_CHARS: usize = 64;
pub const MAX_PASSWORD_CHARS: usize = 128;

/// User service — orchestrates identity use-cases.
///
/// Generic over `R: UserRepositoryInterface` so it stays decoupled from
/// the concrete persistence layer.
pub struct UserService<R: UserRepositoryInterface> {
    repo: Arc<R>,
    ids: Arc<dyn IdAllocator>,
    jwt_config: JwtConfig,
    bcrypt_cost: u32,
}

fn check_length(field: &str, value: &str, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(DomainError::Validation(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(())
}

impl<R: UserRepositoryInterface> UserService<R> {
    pub fn new(
        repo: Arc<R>,
        ids: Arc<dyn IdAllocator>,
        jwt_config: JwtConfig,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            repo,
            ids,
            jwt_config,
            bcrypt_cost,
        }
    }

    // ── Registration ────────────────────────────────────────────

    pub async fn register(&self, username: &str, password: &str) -> DomainResult<User> {
        check_length("username", username, MAX_USERNAME_CHARS)?;
        check_length("password", password, MAX_PASSWORD_CHARS)?;

        if self.repo.get_user_by_username(username).await?.is_some() {
            return Err(DomainError::UserExists);
        }

        let user_id = self.ids.next_id().await?;
        let password_hash = {
            let password = password.to_owned();
            let cost = self.bcrypt_cost;
            tokio::task::spawn_blocking(move || hash_password(&password, cost))
                .await
                .map_err(|e| InfraError::Crypto(e.to_string()))?
                .map_err(|e| InfraError::Crypto(format!("Failed to hash password: {}", e)))?
        };

        let user = User {
            user_id,
            username: username.to_string(),
            password_hash,
        };
        if !self.repo.insert_if_absent(&user).await? {
            return Err(DomainError::UserExists);
        }

        info!(user_id, username = %user.username, "New user registered");
        Ok(user)
    }

    // ── Authentication ──────────────────────────────────────────

    /// Check credentials and mint a signed token.
    ///
    /// Unknown usernames answer exactly like a wrong password.
    pub async fn login(&self, username: &str, password: &str) -> DomainResult<String> {
        let Some(user) = self.repo.get_user_by_username(username).await? else {
            debug!(username, "Login for unknown user");
            return Err(DomainError::WrongPassword);
        };

        let hash = user.password_hash.clone();
        let password = password.to_owned();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| InfraError::Crypto(e.to_string()))?
            .unwrap_or(false);
        if !valid {
            return Err(DomainError::WrongPassword);
        }

        let token = create_token(user.user_id, &user.username, &self.jwt_config)
            .map_err(|e| InfraError::Crypto(format!("Failed to create token: {}", e)))?;

        info!(user_id = user.user_id, username = %user.username, "User logged in");
        Ok(token)
    }

    /// Hand the unused part of the user ID lease back to the store.
    pub async fn release(&self) -> DomainResult<()> {
        self.ids.release().await
    }
}
