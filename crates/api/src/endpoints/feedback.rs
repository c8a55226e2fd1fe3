//! Feedback listing for admins.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use connect_common::AppResult;
use connect_core::FeedbackView;

use crate::{
    extractors::{AuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// Create feedback router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_feedback))
}

/// All feedback, newest first.
async fn list_feedback(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<FeedbackView>>> {
    let feedback = state
        .feedback_service
        .list_feedback(&viewer, page.limit, page.offset)
        .await?;
    Ok(ApiResponse::ok(feedback))
}
