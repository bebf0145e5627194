//! User service for registration, login and account lookup
//!
//! Password hashing and verification run on the blocking thread pool.
//! Tokens come from the shared [`TokenIssuer`], whose keys are computed once
//! at startup.

use crate::auth::{PasswordService, TokenIssuer};
use crate::error::ApiError;
use crate::repositories::{CreateUser, UserRecord, UserRepository};
use devconnector_shared::{validation::normalize_email, AuthError, ResourceError, UserResponse};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

/// Default avatar for an email address.
///
/// Gravatar keys on the SHA-256 of the trimmed, lowercased address and falls
/// back to the "mystery person" image.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(normalize_email(email).as_bytes());
    format!("https://www.gravatar.com/avatar/{:x}?s=200&r=pg&d=mm", digest)
}

/// User service for authentication operations
pub struct UserService;

impl UserService {
    /// Register a new account and return a signed token for it.
    ///
    /// Input is expected to have passed `RegisterRequest` validation.
    pub async fn register(
        pool: &PgPool,
        issuer: &TokenIssuer,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let email = normalize_email(email);

        if UserRepository::email_exists(pool, &email).await? {
            return Err(ApiError::validation(AuthError::UserExists.to_string()));
        }

        let password_hash = PasswordService::hash_async(password.to_string()).await?;

        // A concurrent registration can still win between the check and the insert.
        let user = UserRepository::create(
            pool,
            CreateUser {
                name: name.trim().to_string(),
                avatar: gravatar_url(&email),
                email,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| ApiError::validation(AuthError::UserExists.to_string()))?;

        metrics::counter!("users_registered_total").increment(1);
        info!(user_id = %user.id, "User registered");

        Self::token_for(issuer, user.id)
    }

    /// Exchange email and password for a signed token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(
        pool: &PgPool,
        issuer: &TokenIssuer,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let invalid = || {
            metrics::counter!("auth_logins_total", "outcome" => "rejected").increment(1);
            ApiError::validation(AuthError::InvalidCredentials.to_string())
        };

        let Some(user) = UserRepository::find_by_email(pool, &normalize_email(email)).await? else {
            debug!("Login for unknown email");
            return Err(invalid());
        };

        let valid =
            PasswordService::verify_async(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(invalid());
        }

        metrics::counter!("auth_logins_total", "outcome" => "accepted").increment(1);
        Self::token_for(issuer, user.id)
    }

    /// Account details for an authenticated user
    pub async fn current_user(pool: &PgPool, user_id: Uuid) -> Result<UserResponse, ApiError> {
        Self::find(pool, user_id).await.map(UserRecord::into_response)
    }

    /// Load the caller's record, e.g. to copy name and avatar onto a post
    pub async fn find(pool: &PgPool, user_id: Uuid) -> Result<UserRecord, ApiError> {
        UserRepository::find_by_id(pool, user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(ResourceError::UserNotFound.to_string()))
    }

    fn token_for(issuer: &TokenIssuer, user_id: Uuid) -> Result<String, ApiError> {
        issuer
            .issue(user_id)
            .map_err(|e| ApiError::Internal(e.into()))
    }
}
