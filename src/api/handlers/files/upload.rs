use crate::api::error::AppError;
use crate::services::upload_service::{SourcePosition, UploadOutcome, UploadStatus};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::*;

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Files stored or already complete", body = UploadFormResponse),
        (status = 400, description = "Malformed form, invalid name or aborted stream"),
        (status = 409, description = "Stored size disagrees with the declared total"),
        (status = 413, description = "Declared size above the limit")
    ),
    tag = "files"
)]
pub async fn upload_form(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadFormResponse>, AppError> {
    let mut outcomes = Vec::new();
    let mut total_size: Option<u64> = None;

    let result: Result<(), AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("length limit exceeded") {
                AppError::PayloadTooLarge(
                    "Request body exceeds the maximum allowed limit".to_string(),
                )
            } else {
                AppError::BadRequest(err_msg)
            }
        })? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "total_size" {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                total_size = Some(text.trim().parse().map_err(|_| {
                    AppError::BadRequest(format!("Invalid total_size: {text:?}"))
                })?);
            } else if let Some(filename) = field.file_name().map(str::to_string) {
                let declared = total_size.take().ok_or_else(|| {
                    AppError::BadRequest(
                        "A total_size field must precede every file part".to_string(),
                    )
                })?;

                let body_with_io_error = field.map_err(std::io::Error::other);
                let reader = StreamReader::new(body_with_io_error);
                tokio::pin!(reader);

                let outcome = state
                    .uploads
                    .upload(&filename, declared, SourcePosition::Start, &mut reader)
                    .await?;
                tracing::info!("⬆️  upload   {}", outcome.name);
                outcomes.push(outcome);
            }
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) if outcomes.is_empty() => Err(AppError::BadRequest("No file provided".to_string())),
        Ok(()) => Ok(Json(UploadFormResponse { files: outcomes })),
        Err(e) => {
            // Drain the rest of the form so the client sees our response instead of a reset.
            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}

#[utoipa::path(
    put,
    path = "/upload/{name}",
    params(
        ("name" = String, Path, description = "Target file name"),
        ("X-Total-Size" = u64, Header, description = "Size of the complete file"),
        ("X-Upload-Offset" = Option<u64>, Header, description = "Offset the body starts at")
    ),
    request_body(content = String, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "File stored or already complete", body = UploadOutcome),
        (status = 400, description = "Missing headers, invalid name or aborted stream"),
        (status = 409, description = "Offset or stored size disagrees"),
        (status = 413, description = "Declared size above the limit")
    ),
    tag = "files"
)]
pub async fn upload_raw(
    State(state): State<crate::AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadOutcome>, AppError> {
    let declared = header_u64(&headers, TOTAL_SIZE_HEADER)?.ok_or_else(|| {
        AppError::BadRequest(format!("Missing {TOTAL_SIZE_HEADER} header"))
    })?;
    let position = match header_u64(&headers, UPLOAD_OFFSET_HEADER)? {
        Some(offset) => SourcePosition::Offset(offset),
        None => SourcePosition::Start,
    };

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let reader = StreamReader::new(stream);
    tokio::pin!(reader);

    let outcome = state
        .uploads
        .upload(&name, declared, position, &mut reader)
        .await?;
    tracing::info!("⬆️  upload   {}", outcome.name);
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/upload/{name}/status",
    params(
        ("name" = String, Path, description = "Target file name"),
        UploadStatusQuery
    ),
    responses(
        (status = 200, description = "Where the next attempt would start", body = UploadStatus),
        (status = 400, description = "Invalid file name"),
        (status = 409, description = "Stored size exceeds the declared total")
    ),
    tag = "files"
)]
pub async fn upload_status(
    State(state): State<crate::AppState>,
    Path(name): Path<String>,
    Query(query): Query<UploadStatusQuery>,
) -> Result<Json<UploadStatus>, AppError> {
    let status = state.uploads.status(&name, query.total_size).await?;
    Ok(Json(status))
}

fn header_u64(headers: &HeaderMap, name: &str) -> Result<Option<u64>, AppError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Some)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid {name} header")))
}
