//! Own profile endpoints.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, FixedOffset};
use connect_common::AppResult;
use connect_core::{UpdateProfileInput, UserWithRole};
use connect_db::entities::user_role::Role;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create profile router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_me).patch(update_me))
}

/// Profile with role.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub center: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<UserWithRole> for UserResponse {
    fn from(user: UserWithRole) -> Self {
        let p = user.profile;
        Self {
            id: p.id,
            email: p.email,
            full_name: p.full_name,
            center: p.center,
            avatar_url: p.avatar_url,
            role: user.role,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// The signed-in user.
async fn get_me(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserResponse>> {
    let me = state.profile_service.get_me(&viewer).await?;
    Ok(ApiResponse::ok(me.into()))
}

/// Update profile request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub full_name: Option<String>,
    pub center: Option<String>,
    pub avatar_url: Option<String>,
}

/// Change own name, center or avatar.
async fn update_me(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateMeRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let me = state
        .profile_service
        .update_me(
            &viewer,
            UpdateProfileInput {
                full_name: req.full_name,
                center: req.center,
                avatar_url: req.avatar_url,
            },
        )
        .await?;
    Ok(ApiResponse::ok(me.into()))
}
