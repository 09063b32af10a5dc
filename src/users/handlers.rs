use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{extractors::CurrentUser, repo_types::User},
    error::ApiError,
    state::AppState,
};

use super::dto::{clamp_page, ListUsersQuery, Pagination, UserListResponse};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/profile", get(profile))
        .route("/auth/users", get(list_users))
}

#[instrument(skip(user))]
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[instrument(skip(state, user))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let (page, limit) = clamp_page(&query);
    let offset = (page - 1) * limit;

    // Admins may filter by any role; everyone else only sees students.
    let role = if user.is_admin() {
        query.role.clone()
    } else {
        Some("student".to_string())
    };

    let users = User::list_by_role(&state.db, role.as_deref(), limit, offset).await?;
    let total = User::count_by_role(&state.db, role.as_deref()).await?;

    Ok(Json(UserListResponse {
        users,
        pagination: Pagination::new(page, limit, total),
    }))
}
