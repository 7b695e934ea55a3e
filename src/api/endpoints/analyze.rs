//! Referral analysis endpoint.
//!
//! `POST /analyze`: multipart upload of one referral (PDF or image), which is
//! validated, forwarded to the model, and returned both as raw text and as a
//! parsed assessment.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{AnalyzeResponse, ApiContext};
use crate::assessment::assess_document;
use crate::upload::{validate_upload, UploadError};

/// Multipart field names that carry the document. The first one present wins.
const FILE_FIELDS: &[&str] = &["document", "file"];

struct RawUpload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// `POST /analyze`: assess an uploaded referral.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let raw = read_file_field(multipart).await?;
    let document = validate_upload(
        &raw.filename,
        raw.content_type.as_deref(),
        raw.bytes,
        ctx.max_upload_bytes,
    )?;

    tracing::info!(
        filename = %document.filename,
        mime = %document.mime_type,
        size = document.size_bytes(),
        "Referral received"
    );

    let client = ctx.client.clone();
    let outcome = tokio::task::spawn_blocking(move || assess_document(&*client, &document))
        .await
        .map_err(|e| ApiError::Internal(format!("Assessment task failed: {e}")))??;

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis_id: Uuid::new_v4().to_string(),
        analysis: outcome.analysis,
        assessment: outcome.assessment,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

async fn read_file_field(mut multipart: Multipart) -> Result<RawUpload, ApiError> {
    let mut upload: Option<RawUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default();
        if upload.is_some() || !FILE_FIELDS.contains(&name) {
            continue;
        }

        let filename = field.file_name().unwrap_or("document").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        upload = Some(RawUpload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    upload.ok_or_else(|| UploadError::MissingFile.into())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        tracing::warn!(error = %e, "Failed to read multipart body");
        ApiError::BadRequest(format!("Failed to read upload: {}", e.body_text()))
    }
}
