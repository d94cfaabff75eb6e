use axum::Json;
use axum::extract::State;
use axum::extract::multipart::{Multipart, MultipartRejection};

use crate::app::upload::StoredUpload;
use crate::error::ApiError;
use crate::server::{AppState, AuthSession};

const FILE_FIELD: &str = "file";

/// Accepts the `file` field of a multipart form. The size limit is checked
/// per received chunk, so an oversized body is refused before anything is
/// written to disk.
pub async fn upload(
    State(state): State<AppState>,
    _session: AuthSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StoredUpload>, ApiError> {
    let mut multipart = multipart?;
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let category = state.uploads.check_type(field.content_type())?;
        let file_name = field.file_name().map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            state
                .uploads
                .check_size((data.len() + chunk.len()) as u64)?;
            data.extend_from_slice(&chunk);
        }

        let stored = state
            .uploads
            .save(category, file_name.as_deref(), &data)
            .await?;
        return Ok(Json(stored));
    }
    Err(ApiError::invalid(FILE_FIELD, "No file uploaded"))
}
