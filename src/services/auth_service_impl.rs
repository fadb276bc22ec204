//! `SeaORM` implementation of the [`AuthService`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::{NewUser, Store};
use crate::models::user::{User, UserStatus};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::token_service::{Identity, TokenService, Verification};

const INVALID_CREDENTIALS: &str = "Invalid email or password.";
const INACTIVE_ACCOUNT: &str = "Your account is inactive. Please contact admin.";
// One message for unknown, consumed, and expired codes so a caller cannot
// tell which of them happened.
const INVALID_OTP: &str = "Invalid or expired OTP code.";

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenService>, config: Arc<RwLock<Config>>) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }

    async fn reload_with_profile(&self, user_id: i32) -> Result<User, AuthError> {
        let (user, profile) = self
            .store
            .get_user_with_profile(user_id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("User {user_id} vanished after write")))?;

        Ok(User::with_profile(user, profile))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, data: NewUser) -> Result<User, AuthError> {
        let exists = self
            .store
            .user_exists_with_email_or_username(&data.email, data.username.as_deref())
            .await?;

        if exists {
            return Err(AuthError::Conflict("User already exists".to_string()));
        }

        let security = self.config.read().await.security.clone();
        let (user, _profile) = self.store.create_user_with_profile(data, &security).await?;

        self.reload_with_profile(user.id).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AuthError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let password_matches = self
            .store
            .verify_user_password(password, &user.password_hash)
            .await?;

        if !password_matches {
            return Err(AuthError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if UserStatus::from_db(&user.status) != UserStatus::Active {
            return Err(AuthError::Unauthorized(INACTIVE_ACCOUNT.to_string()));
        }

        let identity = Identity {
            id: user.id,
            username: user.username.clone(),
            role: Some(user.role.clone()),
        };

        // Both tokens carry identical claims and TTL; nothing distinguishes
        // the refresh token beyond its name.
        let access_token = self.tokens.issue(&identity)?;
        let refresh_token = self.tokens.issue(&identity)?;

        self.store.set_user_logged_in(user.id, true).await?;

        let user = self.reload_with_profile(user.id).await?;

        Ok(LoginResult {
            access_token,
            refresh_token,
            user,
        })
    }

    async fn logout(&self, user_id: i32) -> Result<(), AuthError> {
        // Fetch-or-fail: logging out without ever having logged in is a 404.
        self.store.get_session_by_user_or_err(user_id).await?;
        self.store.set_user_logged_in(user_id, false).await?;

        Ok(())
    }

    async fn change_password(
        &self,
        user_id: i32,
        new_password: &str,
        old_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.store.get_user_by_id_or_err(user_id).await?;

        let authorized = self
            .store
            .verify_user_password(old_password, &user.password_hash)
            .await?;

        if !authorized {
            return Err(AuthError::Unauthorized("Wrong password.".to_string()));
        }

        let security = self.config.read().await.security.clone();
        self.store
            .update_user_password(user.id, new_password, &security)
            .await?;

        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        match self.tokens.verify(refresh_token) {
            Verification::Valid(claims) => {
                // Role is dropped on refresh; only id and username survive.
                let identity = Identity {
                    id: claims.id,
                    username: claims.username,
                    role: None,
                };
                Ok(self.tokens.issue(&identity)?)
            }
            Verification::Expired | Verification::Invalid => Err(AuthError::Unauthorized(
                "Invalid or expired refresh token.".to_string(),
            )),
        }
    }

    async fn is_logged_in(&self, user_id: i32) -> Result<bool, AuthError> {
        Ok(self.store.is_user_logged_in(user_id).await?)
    }

    async fn set_up_otp(&self, user_id: i32) -> Result<String, AuthError> {
        let user = self.store.get_user_by_id_or_err(user_id).await?;

        let code = generate_otp_code();
        self.store.set_session_otp(user.id, &code).await?;

        Ok(code)
    }

    async fn remove_otp(&self, user_id: i32) -> Result<(), AuthError> {
        Ok(self.store.clear_session_otp(user_id).await?)
    }

    async fn verify_otp(&self, code: &str, new_password: &str) -> Result<(), AuthError> {
        let flag = self
            .store
            .find_session_by_otp(code)
            .await?
            .ok_or_else(|| AuthError::BadRequest(INVALID_OTP.to_string()))?;

        let issued_at = flag
            .otp_created_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .ok_or_else(|| AuthError::BadRequest(INVALID_OTP.to_string()))?;

        let ttl_minutes = self.config.read().await.auth.otp_ttl_minutes;
        let age = Utc::now().signed_duration_since(issued_at);

        if age > Duration::minutes(ttl_minutes) {
            return Err(AuthError::BadRequest(INVALID_OTP.to_string()));
        }

        // Consume the code with a single conditional update; a concurrent
        // verification that lost the race gets the generic rejection.
        let claimed = self.store.claim_session_otp(code).await?;
        if !claimed {
            return Err(AuthError::BadRequest(INVALID_OTP.to_string()));
        }

        let security = self.config.read().await.security.clone();
        self.store
            .update_user_password(flag.user_id, new_password, &security)
            .await?;

        Ok(())
    }

    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = match self.tokens.verify(token) {
            Verification::Valid(claims) => claims,
            Verification::Expired | Verification::Invalid => {
                return Err(AuthError::Unauthorized("Invalid token.".to_string()));
            }
        };

        if !self.store.is_user_logged_in(claims.id).await? {
            return Err(AuthError::Unauthorized("Invalid token.".to_string()));
        }

        let (user, profile) = self
            .store
            .get_user_with_profile(claims.id)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Invalid token.".to_string()))?;

        Ok(User::with_profile(user, profile))
    }
}

const OTP_RANGE: u32 = 1_000_000;
// Draws at or above this would wrap unevenly onto the code range.
const OTP_REJECT_ABOVE: u32 = u32::MAX - (u32::MAX % OTP_RANGE);

fn six_digit_code(raw: u32) -> Option<String> {
    (raw < OTP_REJECT_ABOVE).then(|| format!("{:06}", raw % OTP_RANGE))
}

/// 6-digit numeric code from the OS CSPRNG, uniform via rejection sampling.
fn generate_otp_code() -> String {
    use argon2::password_hash::rand_core::{OsRng, RngCore};

    loop {
        if let Some(code) = six_digit_code(OsRng.next_u32()) {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_code_shape() {
        for _ in 0..100 {
            let code = generate_otp_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_otp_draws_outside_uniform_range_are_rejected() {
        assert_eq!(six_digit_code(u32::MAX), None);
        assert_eq!(six_digit_code(OTP_REJECT_ABOVE), None);
        assert_eq!(
            six_digit_code(OTP_REJECT_ABOVE - 1),
            Some("999999".to_string())
        );
    }

    #[test]
    fn test_otp_codes_are_zero_padded() {
        assert_eq!(six_digit_code(42), Some("000042".to_string()));
    }
}
