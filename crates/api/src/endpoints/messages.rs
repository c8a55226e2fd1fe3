//! Conversation list endpoints.

use std::collections::HashMap;

use axum::{Router, extract::State, routing::get};
use connect_common::AppResult;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create messages router.
pub fn router() -> Router<AppState> {
    Router::new().route("/unread", get(unread_by_complaint))
}

/// Unread message counts keyed by complaint id.
async fn unread_by_complaint(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<HashMap<String, i64>>> {
    let counts = state.messaging_service.unread_by_complaint(&viewer).await?;
    Ok(ApiResponse::ok(counts))
}
