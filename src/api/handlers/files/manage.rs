use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Query, State},
};

use super::types::*;

#[utoipa::path(
    delete,
    path = "/delete",
    params(FileIdQuery),
    responses(
        (status = 200, description = "File deleted", body = DeleteResponse),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Query(query): Query<FileIdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.storage.delete(&query.id).await?;
    tracing::info!("🗑️  delete   {}", deleted.path);
    Ok(Json(DeleteResponse { deleted }))
}

/// Same as [`delete_file`] for clients that can only send forms.
#[utoipa::path(
    post,
    path = "/delete",
    params(FileIdQuery),
    responses(
        (status = 200, description = "File deleted", body = DeleteResponse),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn delete_file_post(
    state: State<crate::AppState>,
    query: Query<FileIdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    delete_file(state, query).await
}
