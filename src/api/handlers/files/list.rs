use crate::api::error::AppError;
use axum::{Json, extract::State};

use super::types::*;

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "Every file in the shared directory", body = FileListResponse)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = state.storage.list().await?;
    Ok(Json(FileListResponse { files }))
}
