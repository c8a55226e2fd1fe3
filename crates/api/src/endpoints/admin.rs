//! Admin endpoints: user management and analytics.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use chrono::Utc;
use connect_common::AppResult;
use connect_core::{DashboardStats, Overview, UpdateUserInput, UserStats};
use connect_db::entities::user_role::Role;
use serde::Deserialize;

use crate::{
    endpoints::me::UserResponse, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Create admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", patch(update_user))
        .route("/users/{id}/stats", get(user_stats))
        .route("/analytics", get(overview))
        .route("/dashboard", get(dashboard))
}

/// List users query.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

async fn list_users(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let users = state
        .profile_service
        .list_users(&viewer, search, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

async fn user_stats(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserStats>> {
    let stats = state.profile_service.user_stats(&viewer, &id).await?;
    Ok(ApiResponse::ok(stats))
}

/// Update user request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub center: Option<String>,
    pub role: Option<Role>,
}

async fn update_user(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .profile_service
        .update_user(
            &viewer,
            &id,
            UpdateUserInput {
                full_name: req.full_name,
                center: req.center,
                role: req.role,
            },
        )
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn overview(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Overview>> {
    let overview = state.analytics_service.overview(&viewer, Utc::now()).await?;
    Ok(ApiResponse::ok(overview))
}

async fn dashboard(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStats>> {
    let stats = state.analytics_service.dashboard(&viewer).await?;
    Ok(ApiResponse::ok(stats))
}
