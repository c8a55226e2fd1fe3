//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use connect_common::StorageBackend;
use connect_core::{
    AnalyticsService, AnnouncementService, BadgeService, CenterService, ChangeBus,
    ComplaintService, FeedbackService, MeetingService, MessagingService, ProfileService,
    TimelineService,
};
use tracing::warn;

use crate::auth::TokenVerifier;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub complaint_service: ComplaintService,
    pub timeline_service: TimelineService,
    pub messaging_service: MessagingService,
    pub badge_service: BadgeService,
    pub feedback_service: FeedbackService,
    pub announcement_service: AnnouncementService,
    pub meeting_service: MeetingService,
    pub profile_service: ProfileService,
    pub center_service: CenterService,
    pub analytics_service: AnalyticsService,
    pub change_bus: ChangeBus,
    pub storage: Arc<dyn StorageBackend>,
    pub token_verifier: Arc<TokenVerifier>,
    /// Interval between SSE keep-alive comments.
    pub keep_alive: Duration,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

/// Authentication middleware.
///
/// A valid bearer token puts a [`connect_core::Viewer`] into the request
/// extensions. Anything else leaves the request anonymous, and extractors
/// that need a viewer reject it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(Authorization(bearer)) = req.headers().typed_get::<Authorization<Bearer>>()
        && let Ok(claims) = state.token_verifier.verify(bearer.token())
    {
        match state.profile_service.resolve_viewer(&claims).await {
            Ok(viewer) => {
                req.extensions_mut().insert(viewer);
            }
            Err(e) => warn!(error = %e, subject = %claims.subject, "Failed to resolve viewer"),
        }
    }

    next.run(req).await
}
