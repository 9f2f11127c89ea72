//! Axum route handlers for document upload.

use axum::{
    extract::{multipart::MultipartError, Multipart},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::documents::extract::extract_text;
use crate::errors::AppError;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub text: String,
    pub characters: usize,
}

/// POST /api/v1/documents/extract
///
/// Accepts a multipart upload with a `file` field (PDF or TXT) and returns its
/// text. The text is not sanitized here; it goes through the analyze
/// validator like pasted input.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let text = extract_text(bytes, content_type.as_deref(), file_name.as_deref()).await?;
        let characters = text.chars().count();
        info!(
            "Extracted {characters} chars from upload {}",
            file_name.as_deref().unwrap_or("<unnamed>")
        );
        return Ok(Json(ExtractResponse { text, characters }));
    }

    Err(AppError::Validation(format!(
        "Multipart field '{FILE_FIELD}' is required"
    )))
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid upload: {}", e.body_text()))
}
