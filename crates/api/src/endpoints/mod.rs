//! API endpoints.

pub(crate) mod admin;
pub(crate) mod announcements;
pub(crate) mod attachments;
pub(crate) mod badges;
pub(crate) mod centers;
pub(crate) mod complaints;
pub(crate) mod feedback;
pub(crate) mod me;
pub(crate) mod meetings;
pub(crate) mod messages;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/me", me::router())
        .nest("/complaints", complaints::router())
        .nest("/messages", messages::router())
        .nest("/badges", badges::router())
        .nest("/feedback", feedback::router())
        .nest("/announcements", announcements::router())
        .nest("/meetings", meetings::router())
        .nest("/centers", centers::router())
        .nest("/admin", admin::router())
        .nest("/attachments", attachments::router())
}

/// Liveness probe. Needs no token.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
