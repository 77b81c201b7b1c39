use axum::{extract::Multipart, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::extract::{extract_text, DocumentKind};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub text: String,
}

/// POST /api/upload-resume
///
/// Expects a multipart form with the document in the `file` field. The file
/// name's extension picks the parser; nothing is parsed for other extensions.
pub async fn handle_upload_resume(
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let kind = DocumentKind::from_file_name(&file_name)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        let size = bytes.len();

        let text = extract_text(bytes, kind).await?;
        info!(
            "Extracted resume '{file_name}' ({size} bytes, {} chars)",
            text.chars().count()
        );
        return Ok(Json(UploadResponse { text }));
    }

    Err(AppError::Validation("No file part in request".to_string()))
}
