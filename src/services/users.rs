//! Accounts and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{RegisterRequest, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a reader account
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;

        let username = request.username.trim();
        if self.repository.users.username_exists(username).await? {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let hash = self.hash_password(&request.password)?;
        let email = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let user = self
            .repository
            .users
            .create(username, &hash, email, false)
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticate by username and return a JWT with the user
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::warn!(username = %user.username, "Failed login attempt");
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let token = UserClaims::for_user(&user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create the configured staff account when it does not exist yet
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            self.config.admin_username.as_deref(),
            self.config.admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.users.username_exists(username).await? {
            return Ok(());
        }

        let hash = self.hash_password(password)?;
        let user = self
            .repository
            .users
            .create(username, &hash, None, true)
            .await?;
        tracing::info!(user_id = user.id, username = %user.username, "Staff account created");
        Ok(())
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
