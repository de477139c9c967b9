use crate::{models::response::ApiResponse, state::AppState};
use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct AboutPage {
    pub title: &'static str,
    pub content: &'static str,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/about/author/", get(author))
        .route("/about/tech/", get(tech))
}

/// GET /about/author/
async fn author() -> Json<ApiResponse<AboutPage>> {
    Json(ApiResponse::success(AboutPage {
        title: "About the author",
        content: "A small community for sharing posts, joining groups and following authors.",
    }))
}

/// GET /about/tech/
async fn tech() -> Json<ApiResponse<AboutPage>> {
    Json(ApiResponse::success(AboutPage {
        title: "Technologies",
        content: "Rust, axum, tokio and SurrealDB.",
    }))
}
