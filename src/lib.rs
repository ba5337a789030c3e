pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::ShareConfig;
use crate::services::storage::LocalStorage;
use crate::services::upload_service::UploadService;
use crate::utils::keyed_mutex::KeyedMutex;
use crate::utils::path_guard::StorageRoot;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room left for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: u64 = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::files::list::list_files,
        api::handlers::files::download::download_file,
        api::handlers::files::manage::delete_file,
        api::handlers::files::manage::delete_file_post,
        api::handlers::files::upload::upload_form,
        api::handlers::files::upload::upload_raw,
        api::handlers::files::upload::upload_status,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::files::FileListResponse,
            api::handlers::files::DeleteResponse,
            api::handlers::files::UploadFormResponse,
            api::handlers::files::UploadForm,
            services::storage::FileEntry,
            services::upload_service::UploadOutcome,
            services::upload_service::UploadStatus,
        )
    ),
    tags(
        (name = "system", description = "Server status"),
        (name = "files", description = "Shared file endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: ShareConfig,
    pub storage: Arc<LocalStorage>,
    pub uploads: Arc<UploadService>,
}

impl AppState {
    /// Wires the services around an already prepared storage root.
    ///
    /// Listing, deletion and uploads share one lock table so a delete waits
    /// for an upload running on the same name.
    pub fn new(config: ShareConfig, root: impl Into<PathBuf>) -> Self {
        let root = StorageRoot::new(root);
        let locks = KeyedMutex::new();
        Self {
            storage: Arc::new(LocalStorage::new(root.clone(), locks.clone())),
            uploads: Arc::new(UploadService::new(root, locks, config.clone())),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_file_size.saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/files", get(api::handlers::files::list_files))
        .route("/download", get(api::handlers::files::download_file))
        .route(
            "/delete",
            post(api::handlers::files::delete_file_post)
                .delete(api::handlers::files::delete_file),
        )
        .route("/upload", post(api::handlers::files::upload_form))
        .route("/upload/:name", put(api::handlers::files::upload_raw))
        .route(
            "/upload/:name/status",
            get(api::handlers::files::upload_status),
        )
        .layer(from_fn(
            api::middleware::request_id::request_id_middleware,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
