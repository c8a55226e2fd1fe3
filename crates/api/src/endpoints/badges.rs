//! Badge count endpoints.

use axum::{Router, extract::State, routing::get};
use connect_common::AppResult;
use connect_core::BadgeCounts;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse, sse};

/// Create badge router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_badges))
        .route("/stream", get(sse::badges_stream))
}

/// Badge counts response.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeResponse {
    pub complaints: u64,
    pub messages: u64,
    pub meetings: u64,
}

impl From<BadgeCounts> for BadgeResponse {
    fn from(counts: BadgeCounts) -> Self {
        Self {
            complaints: counts.complaints,
            messages: counts.messages,
            meetings: counts.meetings,
        }
    }
}

/// Current badge counts.
async fn get_badges(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<BadgeResponse>> {
    let counts = state.badge_service.get_badge_counts(&viewer).await?;
    Ok(ApiResponse::ok(counts.into()))
}
