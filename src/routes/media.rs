use crate::{error::Result, services::media::determine_content_type, state::AppState};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/media/*path", get(serve_file))
}

/// 提供帖子图片
/// GET /media/*path
async fn serve_file(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response> {
    debug!("Serving media file: {}", path);

    let path = path.trim_start_matches('/');
    let data = app_state.media_service.get_file(path).await?;
    let content_type = determine_content_type(path);

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=86400"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        data,
    )
        .into_response())
}
