use crate::{
    config::AuthConfig,
    error::{ApiError, Result},
    services::jwt_service::JWTService,
    store::{NewUser, User, UserStore},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Token plus the account it was issued for
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: Arc<JWTService>,
    config: Arc<AuthConfig>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_service: Arc<JWTService>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            users,
            jwt_service,
            config,
        }
    }

    /// Create an account with the configured starting balance and sign it in
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthTokens> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::BadRequest("Missing Details".to_string()));
        }

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password(password.to_string()).await?;

        let user = self
            .users
            .create_user(NewUser {
                name: name.to_string(),
                email,
                password_hash,
                credit_balance: self.config.starting_credits,
            })
            .await?;

        info!(
            user_id = %user.id,
            credit_balance = user.credit_balance,
            "User registered"
        );

        let token = self.jwt_service.generate_token(user.id)?;
        Ok(AuthTokens { token, user })
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_user_by_email(&email).await? else {
            // Same message as a wrong password, so registered emails are not revealed
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        };

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = self.jwt_service.generate_token(user.id)?;
        Ok(AuthTokens { token, user })
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hash a password using argon2id, off the async executor
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?
}

/// Verify a password against a stored PHC string
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?
}
