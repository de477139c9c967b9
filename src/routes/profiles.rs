use crate::{
    error::Result,
    routes::posts::{page_json, PageQuery},
    state::AppState,
    utils::middleware::{found, OptionalAuth, RequiredAuth},
};
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/:username/", get(profile))
        .route("/:username/follow", get(profile_follow).post(profile_follow))
        .route("/:username/unfollow", get(profile_unfollow).post(profile_unfollow))
}

/// 作者资料页
/// GET /:username/
async fn profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    OptionalAuth(viewer): OptionalAuth,
) -> Result<Json<Value>> {
    let (author, posts) = state
        .feed_service
        .profile_feed(&username, query.page.as_deref())
        .await?;

    let stats = state
        .follow_service
        .stats(&author.id, viewer.as_ref().map(|v| v.id.as_str()))
        .await?;
    let posts_count = posts.pagination.total_items;

    let mut data = page_json(&state, posts).await?;
    data["author"] = json!(author);
    data["posts_count"] = json!(posts_count);
    data["followers_count"] = json!(stats.followers_count);
    data["following_count"] = json!(stats.following_count);
    data["following"] = json!(stats.is_following);

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// 关注的作者的帖子
/// GET /follow/
async fn follow_index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
    RequiredAuth(user): RequiredAuth,
) -> Result<Json<Value>> {
    let posts = state
        .feed_service
        .follow_feed(Some(&user), query.page.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": page_json(&state, posts).await?
    })))
}

/// 关注作者，已关注时不做任何事
/// GET|POST /:username/follow
async fn profile_follow(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    RequiredAuth(user): RequiredAuth,
) -> Result<Response> {
    let author = state.user_service.get_profile_by_username(&username).await?;
    let created = state.follow_service.follow(&user.id, &author.id).await?;
    debug!("Follow {} -> {} (new: {})", user.username, author.username, created);

    Ok(found(&profile_url(&username)))
}

/// 取消关注
/// GET|POST /:username/unfollow
async fn profile_unfollow(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    RequiredAuth(user): RequiredAuth,
) -> Result<Response> {
    let author = state.user_service.get_profile_by_username(&username).await?;
    state.follow_service.unfollow(&user.id, &author.id).await?;

    Ok(found(&profile_url(&username)))
}

fn profile_url(username: &str) -> String {
    format!("/{}/", urlencoding::encode(username))
}
