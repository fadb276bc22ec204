//! Domain service for the authentication and session lifecycle.
//!
//! Orchestrates registration, login/logout, password changes, token
//! refresh, and OTP-based password reset.

use serde::Serialize;
use thiserror::Error;

use crate::db::{GatewayError, NewUser};
use crate::models::user::User;
use crate::services::token_service::TokenError;

/// Errors specific to authentication operations. Variants carry the
/// response message; the API boundary maps variant to status code.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for AuthError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(_) => Self::NotFound(err.to_string()),
            GatewayError::Database(e) => Self::Database(e.to_string()),
            GatewayError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Tokens and the password-stripped user returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a user plus its profile row; all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the email or username is taken.
    async fn register(&self, data: NewUser) -> Result<User, AuthError>;

    /// Verifies credentials, issues an access and a refresh token, and
    /// marks the session flag as logged in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] on bad credentials or an
    /// inactive account.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Flips the session flag to logged out.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] if the user never had a session.
    async fn logout(&self, user_id: i32) -> Result<(), AuthError>;

    /// Replaces the password after checking the old one against the
    /// stored hash.
    async fn change_password(
        &self,
        user_id: i32,
        new_password: &str,
        old_password: &str,
    ) -> Result<(), AuthError>;

    /// Re-issues an access token from a still-valid refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError>;

    /// The authority on whether a verified token should be honored.
    async fn is_logged_in(&self, user_id: i32) -> Result<bool, AuthError>;

    /// Generates and stores a 6-digit reset code, returning it for
    /// delivery by the caller.
    async fn set_up_otp(&self, user_id: i32) -> Result<String, AuthError>;

    /// Clears the stored code and its timestamp together.
    async fn remove_otp(&self, user_id: i32) -> Result<(), AuthError>;

    /// Consumes a reset code and sets the new password. Unknown, already
    /// used, and expired codes are all rejected with the same message.
    async fn verify_otp(&self, code: &str, new_password: &str) -> Result<(), AuthError>;

    /// Full bearer-token check: signature, expiry, logged-in flag, and
    /// that the user still exists.
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;
}
