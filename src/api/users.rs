use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, UserListPage};
use crate::models::user::User;

#[derive(Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// GET /api/v1/users (admin only)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<UserListPage>>, ApiError> {
    let page = state
        .store()
        .list_users_paginated(query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(
        "Users retrieved",
        UserListPage {
            users: page.items.into_iter().map(User::from).collect(),
            total_count: page.total_count,
            current_page: page.current_page,
            total_pages: page.total_pages,
            previous_page: page.previous_page,
            next_page: page.next_page,
        },
    )))
}
