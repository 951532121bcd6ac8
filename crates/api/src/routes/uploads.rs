//! Product image upload handler.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::auth::RequireAdmin;
use crate::services::media::MediaError;
use crate::state::AppState;

/// Largest accepted upload, in bytes.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Upload one image and return its public CDN URL (admin).
///
/// Expects a multipart form with a single `file` field. The bytes are
/// proxied to the image host as-is; nothing is stored locally.
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let media = state.media().ok_or(MediaError::Unconfigured)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_owned()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest(format!(
                "File exceeds the {MAX_UPLOAD_BYTES} byte limit"
            )));
        }

        let url = media
            .upload(&file_name, &content_type, bytes.to_vec())
            .await?;

        tracing::info!(admin_id = %admin.id, %file_name, %url, "image uploaded");
        return Ok(Json(UploadResponse { url }));
    }

    Err(AppError::BadRequest(
        "Multipart body carried no file field".to_owned(),
    ))
}
