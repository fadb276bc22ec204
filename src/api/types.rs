use serde::Serialize;

use crate::models::user::User;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenDto {
    pub access_token: String,
}

/// One page of users with the gateway's navigation metadata.
#[derive(Debug, Serialize)]
pub struct UserListPage {
    pub users: Vec<User>,
    pub total_count: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub previous_page: Option<u64>,
    pub next_page: Option<u64>,
}
