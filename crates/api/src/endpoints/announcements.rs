//! Announcement endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, FixedOffset, Utc};
use connect_common::AppResult;
use connect_core::{CreateAnnouncementInput, UpdateAnnouncementInput};
use connect_db::entities::announcement;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, Pagination, double_option},
    middleware::AppState,
    response::{ApiResponse, Created, ok},
};

/// Create announcement router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active).post(create_announcement))
        .route("/all", get(list_all))
        .route(
            "/{id}",
            patch(update_announcement).delete(delete_announcement),
        )
}

/// Announcement response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementResponse {
    pub id: String,
    pub admin_id: String,
    pub title: String,
    pub message: String,
    pub target_center: Option<String>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<announcement::Model> for AnnouncementResponse {
    fn from(a: announcement::Model) -> Self {
        Self {
            id: a.id,
            admin_id: a.admin_id,
            title: a.title,
            message: a.message,
            target_center: a.target_center,
            is_active: a.is_active,
            expires_at: a.expires_at,
            created_at: a.created_at,
        }
    }
}

/// Announcements currently shown to the viewer.
async fn list_active(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AnnouncementResponse>>> {
    let rows = state
        .announcement_service
        .list_active(&viewer, Utc::now())
        .await?;
    Ok(ApiResponse::ok(rows.into_iter().map(Into::into).collect()))
}

/// Every announcement, newest first. Admin only.
async fn list_all(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<AnnouncementResponse>>> {
    let rows = state
        .announcement_service
        .list_all(&viewer, page.limit, page.offset)
        .await?;
    Ok(ApiResponse::ok(rows.into_iter().map(Into::into).collect()))
}

/// Create announcement request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub message: String,
    pub target_center: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Publish an announcement.
async fn create_announcement(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateAnnouncementRequest>,
) -> AppResult<Created<AnnouncementResponse>> {
    let input = CreateAnnouncementInput {
        title: req.title,
        message: req.message,
        target_center: req.target_center,
        expires_at: req.expires_at,
    };

    let announcement = state.announcement_service.create(&viewer, input).await?;
    Ok(Created(announcement.into()))
}

/// Update announcement request. `null` clears a nullable field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_center: Option<Option<String>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Edit an announcement.
async fn update_announcement(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAnnouncementRequest>,
) -> AppResult<ApiResponse<AnnouncementResponse>> {
    let input = UpdateAnnouncementInput {
        title: req.title,
        message: req.message,
        target_center: req.target_center,
        is_active: req.is_active,
        expires_at: req.expires_at,
    };

    let announcement = state
        .announcement_service
        .update(&viewer, &id, input)
        .await?;
    Ok(ApiResponse::ok(announcement.into()))
}

/// Remove an announcement.
async fn delete_announcement(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.announcement_service.delete(&viewer, &id).await?;
    Ok(ok())
}
