//! Attachment upload endpoint.

use axum::{
    Router,
    extract::{Multipart, Query, State},
    routing::post,
};
use connect_common::{AppError, AppResult, Bucket, generate_storage_key};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{extractors::AuthUser, middleware::AppState, response::Created};

/// Create attachment router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_attachment))
}

/// Upload query.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// `complaint-attachments` (default) or `avatars`.
    pub bucket: Option<String>,
}

/// Stored attachment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub key: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
    pub md5: String,
}

/// Store the multipart field `file` and return its public URL.
async fn upload_attachment(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<Created<AttachmentResponse>> {
    let bucket = match query.bucket.as_deref() {
        None => Bucket::ComplaintAttachments,
        Some(name) => Bucket::parse(name)
            .ok_or_else(|| AppError::Validation(format!("unknown bucket: {name}")))?,
    };

    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        upload = Some((file_name, content_type, data.to_vec()));
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    if data.is_empty() {
        return Err(AppError::Validation("File is empty".to_string()));
    }
    if data.len() > state.max_upload_bytes {
        return Err(AppError::Validation(format!(
            "File exceeds {} bytes",
            state.max_upload_bytes
        )));
    }

    let key = generate_storage_key(&viewer.id, &file_name);
    let stored = state
        .storage
        .upload(bucket, &key, &data, &content_type)
        .await?;

    info!(user_id = %viewer.id, bucket = bucket.as_str(), key = %stored.key, size = stored.size, "Attachment stored");

    Ok(Created(AttachmentResponse {
        key: stored.key,
        url: stored.url,
        size: stored.size,
        content_type: stored.content_type,
        md5: stored.md5,
    }))
}
