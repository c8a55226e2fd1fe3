//! Meeting request endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use chrono::{DateTime, FixedOffset, Utc};
use connect_common::AppResult;
use connect_core::{RequestMeetingInput, UpdateMeetingInput};
use connect_db::entities::meeting::{self, MeetingStatus};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, Pagination},
    middleware::AppState,
    response::{ApiResponse, Created},
};

/// Create meeting router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meetings).post(request_meeting))
        .route("/{id}", patch(update_meeting))
}

/// Meeting response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingResponse {
    pub id: String,
    pub student_id: String,
    pub complaint_id: Option<String>,
    pub admin_id: Option<String>,
    pub requested_date_time: DateTime<FixedOffset>,
    pub scheduled_date_time: Option<DateTime<FixedOffset>>,
    pub status: MeetingStatus,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<meeting::Model> for MeetingResponse {
    fn from(m: meeting::Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            complaint_id: m.complaint_id,
            admin_id: m.admin_id,
            requested_date_time: m.requested_date_time,
            scheduled_date_time: m.scheduled_date_time,
            status: m.status,
            notes: m.notes,
            meeting_link: m.meeting_link,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Students see their own requests, admins all of them.
async fn list_meetings(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<MeetingResponse>>> {
    let meetings = state
        .meeting_service
        .list_meetings(&viewer, page.limit, page.offset)
        .await?;
    Ok(ApiResponse::ok(meetings.into_iter().map(Into::into).collect()))
}

/// Request meeting request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeetingRequest {
    pub requested_date_time: DateTime<Utc>,
    pub complaint_id: Option<String>,
    pub notes: Option<String>,
}

/// Ask for a meeting.
async fn request_meeting(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RequestMeetingRequest>,
) -> AppResult<Created<MeetingResponse>> {
    let meeting = state
        .meeting_service
        .request_meeting(
            &viewer,
            RequestMeetingInput {
                requested_date_time: req.requested_date_time,
                complaint_id: req.complaint_id,
                notes: req.notes,
            },
        )
        .await?;
    Ok(Created(meeting.into()))
}

/// Update meeting request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingRequest {
    pub status: Option<MeetingStatus>,
    pub scheduled_date_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
}

/// Accept, reschedule or reject a request.
async fn update_meeting(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMeetingRequest>,
) -> AppResult<ApiResponse<MeetingResponse>> {
    let meeting = state
        .meeting_service
        .update_meeting(
            &viewer,
            &id,
            UpdateMeetingInput {
                status: req.status,
                scheduled_date_time: req.scheduled_date_time,
                notes: req.notes,
                meeting_link: req.meeting_link,
            },
        )
        .await?;
    Ok(ApiResponse::ok(meeting.into()))
}
