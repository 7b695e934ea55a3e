//! HTTP router.
//!
//! `POST /analyze` (also mounted at `/functions/analyze` for clients built
//! against the serverless deployment), `GET /health`, and an optional static
//! directory served for every other path.

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Headroom on top of the file limit for multipart framing and headers.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the service router.
pub fn triage_router(ctx: ApiContext, static_dir: Option<&Path>) -> Router {
    let body_limit = ctx.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    let api = Router::new()
        .route("/analyze", post(endpoints::analyze::analyze))
        .route("/functions/analyze", post(endpoints::analyze::analyze))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer());

    match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    }
}

/// Browsers on other origins may call the API directly.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
