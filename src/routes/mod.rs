pub mod about;
pub mod media;
pub mod posts;
pub mod profiles;

use crate::{
    error::AppError,
    state::AppState,
    utils::middleware::{auth_middleware, request_logging_middleware},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    trace::TraceLayer,
};
use tracing::{debug, warn};

/// 多部分表单中除图片外的字段预留的大小
const FORM_OVERHEAD: usize = 64 * 1024;

/// 构建完整的应用路由
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_size + FORM_OVERHEAD;

    Router::new()
        .route("/health", get(health_check))
        .merge(about::router())
        .merge(media::router())
        .merge(profiles::router())
        .merge(posts::router())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(origins)
}

async fn health_check() -> &'static str {
    "Rainbow-Posts is running!"
}

async fn not_found(uri: Uri) -> Response {
    debug!("No route for {}", uri.path());
    AppError::not_found("Page").into_response()
}
