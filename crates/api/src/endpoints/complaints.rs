//! Complaint endpoints, including the per-complaint timeline, message thread
//! and feedback.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use connect_common::AppResult;
use connect_core::{
    ComplaintChanges, ComplaintView, CreateComplaintInput, FeedbackView, MessageItem,
    PersonSummary, SendMessageInput, SubmitFeedbackInput, TimelineItem,
};
use connect_db::{
    entities::{
        complaint::{self, ComplaintCategory, ComplaintPriority, ComplaintStatus},
        complaint_timeline::{self, TimelineAction},
    },
    repositories::ComplaintFilter,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created},
    sse,
};

/// Create complaint router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_complaints).post(create_complaint))
        .route("/{id}", get(get_complaint).patch(update_complaint))
        .route("/{id}/timeline", get(list_timeline))
        .route("/{id}/messages", get(list_messages).post(send_message))
        .route("/{id}/messages/read", post(mark_read))
        .route("/{id}/messages/stream", get(sse::thread_stream))
        .route("/{id}/feedback", get(get_feedback).post(submit_feedback))
}

/// Complaint response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub id: String,
    /// `null` when the creator is hidden from the viewer.
    pub user_id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub center: String,
    pub is_anonymous: bool,
    pub attachment_url: Option<String>,
    pub assigned_admin_id: Option<String>,
    pub version: i32,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<PersonSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_admin: Option<PersonSummary>,
}

impl ComplaintResponse {
    fn from_model(c: complaint::Model, hide_owner: bool) -> Self {
        Self {
            id: c.id,
            user_id: (!hide_owner).then_some(c.user_id),
            title: c.title,
            description: c.description,
            category: c.category,
            priority: c.priority,
            status: c.status,
            center: c.center,
            is_anonymous: c.is_anonymous,
            attachment_url: c.attachment_url,
            assigned_admin_id: c.assigned_admin_id,
            version: c.version,
            created_at: c.created_at,
            updated_at: c.updated_at,
            creator: None,
            assigned_admin: None,
        }
    }
}

impl From<ComplaintView> for ComplaintResponse {
    fn from(view: ComplaintView) -> Self {
        Self {
            creator: view.creator,
            assigned_admin: view.assigned_admin,
            ..Self::from_model(view.complaint, view.identity_hidden)
        }
    }
}

/// Timeline entry response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntryResponse {
    pub id: String,
    pub complaint_id: String,
    pub action_type: TimelineAction,
    pub title: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub notes: Option<String>,
    /// `null` when the actor is the hidden creator.
    pub action_by: Option<String>,
    pub actor_name: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<TimelineItem> for TimelineEntryResponse {
    fn from(item: TimelineItem) -> Self {
        let entry = item.entry;
        Self {
            id: entry.id,
            complaint_id: entry.complaint_id,
            action_type: entry.action_type,
            title: item.title,
            old_value: entry.old_value,
            new_value: entry.new_value,
            notes: entry.notes,
            action_by: (!item.actor_hidden).then_some(entry.action_by),
            actor_name: item.actor_name,
            created_at: entry.created_at,
        }
    }
}

impl From<complaint_timeline::Model> for TimelineEntryResponse {
    fn from(entry: complaint_timeline::Model) -> Self {
        let title = entry
            .action_type
            .title(entry.old_value.as_deref(), entry.new_value.as_deref());
        Self::from(TimelineItem {
            entry,
            title,
            actor_name: None,
            actor_hidden: false,
        })
    }
}

/// Message response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub complaint_id: String,
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
    pub sender_name: Option<String>,
    pub message_text: String,
    pub attachment_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl From<MessageItem> for MessageResponse {
    fn from(item: MessageItem) -> Self {
        let message = item.message;
        Self {
            id: message.id,
            complaint_id: message.complaint_id,
            sender_id: (!item.sender_hidden).then_some(message.sender_id),
            receiver_id: (!item.receiver_hidden).then_some(message.receiver_id),
            sender_name: item.sender_name,
            message_text: message.message_text,
            attachment_url: message.attachment_url,
            is_read: message.is_read,
            created_at: message.created_at,
        }
    }
}

/// List complaints query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListComplaintsQuery {
    pub status: Option<ComplaintStatus>,
    pub category: Option<ComplaintCategory>,
    pub center: Option<String>,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// List complaints.
async fn list_complaints(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListComplaintsQuery>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    let filter = ComplaintFilter {
        user_id: None,
        status: query.status,
        category: query.category,
        center: query.center.filter(|c| !c.trim().is_empty()),
        search: query.search.filter(|s| !s.trim().is_empty()),
        limit: query.limit,
        offset: query.offset,
    };

    let complaints = state
        .complaint_service
        .list_complaints(&viewer, filter)
        .await?;

    Ok(ApiResponse::ok(
        complaints.into_iter().map(ComplaintResponse::from).collect(),
    ))
}

/// Create complaint request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintRequest {
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: Option<ComplaintPriority>,
    pub center: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub attachment_url: Option<String>,
}

/// Raise a complaint.
async fn create_complaint(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateComplaintRequest>,
) -> AppResult<Created<ComplaintResponse>> {
    let input = CreateComplaintInput {
        title: req.title,
        description: req.description,
        category: req.category,
        priority: req.priority,
        center: req.center,
        is_anonymous: req.is_anonymous,
        attachment_url: req.attachment_url,
    };

    let complaint = state
        .complaint_service
        .create_complaint(&viewer, input)
        .await?;

    Ok(Created(ComplaintResponse::from_model(complaint, false)))
}

/// Get a complaint.
async fn get_complaint(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ComplaintResponse>> {
    let view = state.complaint_service.get_complaint(&viewer, &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Update complaint request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComplaintRequest {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<ComplaintPriority>,
    pub category: Option<ComplaintCategory>,
    pub assigned_admin_id: Option<String>,
    pub note: Option<String>,
    pub expected_version: Option<i32>,
}

/// Update complaint response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintUpdateResponse {
    pub complaint: ComplaintResponse,
    pub entries: Vec<TimelineEntryResponse>,
}

/// Admin update of status, priority, category, assignment or notes.
async fn update_complaint(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateComplaintRequest>,
) -> AppResult<ApiResponse<ComplaintUpdateResponse>> {
    let changes = ComplaintChanges {
        status: req.status,
        priority: req.priority,
        category: req.category,
        assigned_admin_id: req.assigned_admin_id,
        note: req.note,
        expected_version: req.expected_version,
    };

    let update = state
        .complaint_service
        .update_complaint(&viewer, &id, changes)
        .await?;
    let hide_owner = update.complaint.is_anonymous;

    Ok(ApiResponse::ok(ComplaintUpdateResponse {
        complaint: ComplaintResponse::from_model(update.complaint, hide_owner),
        entries: update.entries.into_iter().map(Into::into).collect(),
    }))
}

/// Complaint history.
async fn list_timeline(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<TimelineEntryResponse>>> {
    let items = state.timeline_service.list_timeline(&viewer, &id).await?;
    Ok(ApiResponse::ok(items.into_iter().map(Into::into).collect()))
}

/// Message thread of a complaint.
async fn list_messages(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<MessageResponse>>> {
    let messages = state.messaging_service.list_messages(&viewer, &id).await?;
    Ok(ApiResponse::ok(messages.into_iter().map(Into::into).collect()))
}

/// Send message request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(alias = "text")]
    pub message_text: String,
    pub attachment_url: Option<String>,
}

/// Post on a complaint thread.
async fn send_message(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Created<MessageResponse>> {
    let message = state
        .messaging_service
        .send_message(
            &viewer,
            &id,
            SendMessageInput {
                text: req.message_text,
                attachment_url: req.attachment_url,
            },
        )
        .await?;

    Ok(Created(message.into()))
}

/// Mark read response.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// Mark the viewer's messages on a thread as read.
async fn mark_read(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MarkReadResponse>> {
    let updated = state.messaging_service.mark_read(&viewer, &id).await?;
    Ok(ApiResponse::ok(MarkReadResponse { updated }))
}

/// Feedback left on a complaint, `null` if none yet.
async fn get_feedback(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Option<FeedbackView>>> {
    let feedback = state.feedback_service.get_feedback(&viewer, &id).await?;
    Ok(ApiResponse::ok(feedback))
}

/// Submit feedback request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    pub rating: i32,
    pub comment: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Rate a resolved complaint.
async fn submit_feedback(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitFeedbackRequest>,
) -> AppResult<Created<FeedbackView>> {
    let feedback = state
        .feedback_service
        .submit_feedback(
            &viewer,
            &id,
            SubmitFeedbackInput {
                rating: req.rating,
                comment: req.comment,
                is_anonymous: req.is_anonymous,
            },
        )
        .await?;

    Ok(Created(feedback))
}
