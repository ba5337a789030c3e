use crate::services::storage::FileEntry;
use crate::services::upload_service::UploadOutcome;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Header carrying the size the complete file will have.
pub const TOTAL_SIZE_HEADER: &str = "x-total-size";
/// Header carrying the offset the request body starts at.
pub const UPLOAD_OFFSET_HEADER: &str = "x-upload-offset";

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileIdQuery {
    /// Path of the file relative to the shared directory
    pub id: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadStatusQuery {
    /// Size the complete file will have
    pub total_size: u64,
}

#[derive(Serialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: FileEntry,
}

#[derive(Serialize, ToSchema)]
pub struct UploadFormResponse {
    pub files: Vec<UploadOutcome>,
}

/// Multipart body of `POST /upload`. Repeat both fields for several files.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    /// Size of the file part that follows
    pub total_size: u64,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
