//! Multipart image-upload handler.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use doorlead_blob::{UploadError, UploadFile};

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub(in crate::api) struct UploadResponse {
    pub success: bool,
    pub urls: Vec<String>,
}

/// POST /api/upload-images — validate and store a batch of images.
///
/// Files arrive as repeated `images` multipart fields. The whole batch is
/// validated before the first byte reaches storage; the returned URLs keep
/// the input order so the update step can attach them as submitted.
pub(in crate::api) async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let Some(blob) = state.blob.as_ref() else {
        tracing::error!("upload requested but BLOB_READ_WRITE_TOKEN is not configured");
        return Err(ApiError::internal("Image storage is not configured"));
    };

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed upload request: {e}")))?
    {
        if field.name() != Some("images") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

        files.push(UploadFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    match blob.upload_batch(&files).await {
        Ok(urls) => Ok(Json(UploadResponse {
            success: true,
            urls,
        })),
        Err(UploadError::Validation(message)) => Err(ApiError::validation(message)),
        Err(e) => {
            tracing::error!(error = %e, "image upload failed");
            Err(ApiError::internal("Failed to upload images").with_details(e.to_string()))
        }
    }
}
