//! Center endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, FixedOffset};
use connect_common::AppResult;
use connect_db::entities::center;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created, ok},
};

/// Create center router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_centers).post(create_center))
        .route("/{id}", patch(update_center).delete(delete_center))
}

/// Center response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterResponse {
    pub id: String,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<center::Model> for CenterResponse {
    fn from(c: center::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            location: c.location,
            created_at: c.created_at,
        }
    }
}

/// All centers by name. Any signed-in user may read them.
async fn list_centers(
    AuthUser(_viewer): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CenterResponse>>> {
    let centers = state.center_service.list().await?;
    Ok(ApiResponse::ok(centers.into_iter().map(Into::into).collect()))
}

/// Create center request.
#[derive(Debug, Deserialize)]
pub struct CreateCenterRequest {
    pub name: String,
    pub location: String,
}

async fn create_center(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCenterRequest>,
) -> AppResult<Created<CenterResponse>> {
    let center = state
        .center_service
        .create(&viewer, &req.name, &req.location)
        .await?;
    Ok(Created(center.into()))
}

/// Update center request.
#[derive(Debug, Deserialize)]
pub struct UpdateCenterRequest {
    pub name: Option<String>,
    pub location: Option<String>,
}

async fn update_center(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCenterRequest>,
) -> AppResult<ApiResponse<CenterResponse>> {
    let center = state
        .center_service
        .update(&viewer, &id, req.name.as_deref(), req.location.as_deref())
        .await?;
    Ok(ApiResponse::ok(center.into()))
}

async fn delete_center(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.center_service.delete(&viewer, &id).await?;
    Ok(ok())
}
