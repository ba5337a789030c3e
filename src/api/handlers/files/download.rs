use crate::api::error::AppError;
use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{HeaderValue, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::types::*;

#[utoipa::path(
    get,
    path = "/download",
    params(FileIdQuery),
    responses(
        (status = 200, description = "File content stream"),
        (status = 206, description = "Requested byte range"),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Query(query): Query<FileIdQuery>,
    request: Request,
) -> Result<Response, AppError> {
    let (path, entry) = state.storage.stat(&query.id).await?;

    // ServeFile answers Range and conditional requests for us.
    let response = ServeFile::new_with_mime(&path, &mime::APPLICATION_OCTET_STREAM)
        .oneshot(request)
        .await
        .map_err(|e: std::convert::Infallible| -> AppError { match e {} })?;

    let mut response = response.map(Body::new);
    if response.status().is_success() {
        if let Ok(value) = HeaderValue::from_str(&content_disposition(&entry.name)) {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
        tracing::info!("📤 download {} ({} bytes)", entry.path, entry.size);
    }

    Ok(response)
}

pub(crate) fn content_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_encodes_unicode() {
        let value = content_disposition("résumé \"v2\".pdf");
        assert!(value.starts_with("attachment; filename=\"rsum v2.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''r%C3%A9sum%C3%A9%20%22v2%22%2Epdf"));
    }

    #[test]
    fn test_content_disposition_fallback_name() {
        assert!(content_disposition("日本.txt").contains("filename=\".txt\""));
        assert!(content_disposition("日本").contains("filename=\"file\""));
    }
}
