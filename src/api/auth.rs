use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{AccessTokenDto, ApiError, ApiResponse, AppState, TokenPairDto};
use crate::db::NewUser;
use crate::models::user::User;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub fullname: String,
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub x: Option<String>,
    pub linked_in: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub otp_code: String,
    pub new_password: String,
}

/// Authenticated user inserted into request extensions by [`require_auth`].
#[derive(Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Requires a `Authorization: Bearer <token>` header. The token must verify,
/// the session flag must still be logged in, and the user must still exist.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::Forbidden("Missing access token".to_string()))?;

    let user = state.auth_service().authenticate(&token).await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Runs after [`require_auth`]; rejects non-admin callers.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.0.role == crate::models::user::UserRole::Admin);

    if !is_admin {
        return Err(ApiError::Forbidden("Access Denied".to_string()));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?;
    Some(token.trim().to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&payload)?;

    let user = state
        .auth_service()
        .register(NewUser {
            fullname: payload.fullname,
            username: payload.username,
            email: payload.email,
            password: payload.password,
            avatar: payload.avatar,
            phone_number: payload.phone_number,
            bio: payload.bio,
            facebook: payload.facebook,
            instagram: payload.instagram,
            x: payload.x,
            linked_in: payload.linked_in,
        })
        .await?;

    info!("User registered: {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered successfully", user)),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPairDto>>, ApiError> {
    let mut errors = Vec::new();
    if payload.email.is_empty() {
        errors.push("Email is required".to_string());
    }
    if payload.password.is_empty() {
        errors.push("Password is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let result = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(
        "Login successful",
        TokenPairDto {
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            user: result.user,
        },
    )))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.auth_service().logout(user.id).await?;

    Ok(Json(ApiResponse::message("Logged out successfully")))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AccessTokenDto>>, ApiError> {
    let access_token = state.auth_service().refresh(&payload.refresh_token).await?;

    Ok(Json(ApiResponse::success(
        "Token refreshed",
        AccessTokenDto { access_token },
    )))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_new_password(&payload.new_password)?;

    state
        .auth_service()
        .change_password(user.id, &payload.new_password, &payload.old_password)
        .await?;

    info!("Password changed for user {}", user.id);

    Ok(Json(ApiResponse::message("Password updated successfully")))
}

/// POST /api/v1/auth/forgot-password
///
/// Always answers with the same body so the endpoint cannot be used to
/// enumerate registered emails. Code delivery is out of scope; the issued
/// code lands in the session flag row for the delivery channel to pick up.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if let Some(user) = state.store().get_user_by_email(&payload.email).await? {
        state.auth_service().set_up_otp(user.id).await?;
        info!("Password reset code issued for user {}", user.id);
    }

    Ok(Json(ApiResponse::message(
        "If the email is registered, a reset code has been issued.",
    )))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_new_password(&payload.new_password)?;

    state
        .auth_service()
        .verify_otp(&payload.otp_code, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::message("Password reset successfully")))
}

/// GET /api/v1/auth/me
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success("Current user", user))
}

// ============================================================================
// Validation
// ============================================================================

fn validate_registration(payload: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if payload.fullname.trim().is_empty() {
        errors.push("Fullname is required".to_string());
    }
    if payload.email.trim().is_empty() {
        errors.push("Email is required".to_string());
    } else if !payload.email.contains('@') {
        errors.push("Email is invalid".to_string());
    }
    if payload.password.len() < 8 {
        errors.push("Password must be at least 8 characters".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn validate_new_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(vec![
            "Password must be at least 8 characters".to_string(),
        ]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            fullname: "Alice Example".to_string(),
            username: Some("alice".to_string()),
            email: "alice@example.com".to_string(),
            password: "hunter2hunter2".to_string(),
            avatar: None,
            phone_number: None,
            bio: None,
            facebook: None,
            instagram: None,
            x: None,
            linked_in: None,
        }
    }

    #[test]
    fn test_valid_registration_passes() {
        assert!(validate_registration(&request()).is_ok());
    }

    #[test]
    fn test_registration_collects_all_errors() {
        let mut payload = request();
        payload.fullname = "  ".to_string();
        payload.email = "not-an-email".to_string();
        payload.password = "short".to_string();

        match validate_registration(&payload) {
            Err(ApiError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(
            extract_bearer_token(&headers).as_deref(),
            Some("abc.def.ghi")
        );

        let mut basic = HeaderMap::new();
        basic.insert("Authorization", "Basic dXNlcg==".parse().unwrap());
        assert_eq!(extract_bearer_token(&basic), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
