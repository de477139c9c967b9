use crate::{
    cache_get_or_set_async,
    error::{AppError, Result},
    models::{
        comment::{Comment, CreateCommentRequest},
        group::Group,
        media::ImageUpload,
        post::{CreatePostRequest, Post, UpdatePostRequest},
    },
    services::AuthService,
    state::AppState,
    utils::{
        cache::page_key,
        middleware::{found, OptionalAuth, RequiredAuth},
        pagination::Page,
        validation::normalize_optional,
    },
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/new/", get(new_post_form).post(create_post))
        .route("/:username/:post_id/", get(post_view))
        .route("/:username/:post_id/edit/", get(edit_post_form).post(update_post))
        .route("/:username/:post_id/comment", get(comment_redirect).post(add_comment))
}

/// 首页，按页缓存渲染结果
/// GET /
async fn index(State(state): State<Arc<AppState>>, Query(query): Query<PageQuery>) -> Result<Response> {
    let page_number = query.page.clone().unwrap_or_else(|| "1".to_string());
    let key = page_key("index", &page_number);

    let body = cache_get_or_set_async!(
        state.page_cache,
        &key,
        render_index(&state, query.page.as_deref())
    )?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn render_index(state: &AppState, page: Option<&str>) -> Result<Vec<u8>> {
    debug!("Rendering index page {:?}", page);

    let posts = state.feed_service.home_feed(page).await?;
    let body = json!({
        "success": true,
        "data": page_json(state, posts).await?
    });

    Ok(serde_json::to_vec(&body)?)
}

/// 分组页
/// GET /group/:slug/
async fn group_posts(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (group, posts) = state
        .feed_service
        .group_feed(&slug, query.page.as_deref())
        .await?;

    let mut data = page_json(&state, posts).await?;
    data["group"] = json!(group);

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// 新帖子表单
/// GET /new/
async fn new_post_form(
    State(state): State<Arc<AppState>>,
    RequiredAuth(_user): RequiredAuth,
) -> Result<Json<Value>> {
    let groups = state.group_service.list_groups().await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "groups": groups,
            "is_edit": false
        }
    })))
}

/// 发布新帖子
/// POST /new/
async fn create_post(
    State(state): State<Arc<AppState>>,
    RequiredAuth(user): RequiredAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_post_form(multipart).await?;

    let request = CreatePostRequest {
        text: form.text,
        group_id: form.group,
    };
    let post = state
        .post_service
        .create_post(&user.id, request, form.image)
        .await?;

    info!("User {} published post {}", user.username, post.id);
    Ok(found("/"))
}

/// 帖子详情及评论
/// GET /:username/:post_id/
async fn post_view(
    State(state): State<Arc<AppState>>,
    Path((username, post_id)): Path<(String, String)>,
    OptionalAuth(viewer): OptionalAuth,
) -> Result<Json<Value>> {
    let post = state
        .post_service
        .get_post_for_author(&username, &post_id)
        .await?;
    let author = state.user_service.get_profile(&post.author_id).await?;
    let posts_count = state.post_service.count_posts_by_author(&author.id).await?;
    let comments = state.comment_service.list_comments(&post.id).await?;
    let stats = state
        .follow_service
        .stats(&author.id, viewer.as_ref().map(|v| v.id.as_str()))
        .await?;

    let can_edit = AuthService::can_edit(viewer.as_ref(), &post);
    let can_comment = AuthService::can_comment(viewer.as_ref());

    Ok(Json(json!({
        "success": true,
        "data": {
            "post": post_json(&state, &post, &mut Lookups::default()).await?,
            "author": author,
            "posts_count": posts_count,
            "comments": comments_json(&state, comments).await?,
            "followers_count": stats.followers_count,
            "following_count": stats.following_count,
            "following": stats.is_following,
            "can_edit": can_edit,
            "can_comment": can_comment
        }
    })))
}

/// 编辑表单；非作者跳转到帖子页
/// GET /:username/:post_id/edit/
async fn edit_post_form(
    State(state): State<Arc<AppState>>,
    Path((username, post_id)): Path<(String, String)>,
    OptionalAuth(viewer): OptionalAuth,
) -> Result<Response> {
    let post = state
        .post_service
        .get_post_for_author(&username, &post_id)
        .await?;

    if !AuthService::can_edit(viewer.as_ref(), &post) {
        return Ok(found(&post_url(&username, &post_id)));
    }

    let groups = state.group_service.list_groups().await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "post": post,
            "groups": groups,
            "is_edit": true
        }
    }))
    .into_response())
}

/// 保存编辑；非作者跳转到帖子页
/// POST /:username/:post_id/edit/
async fn update_post(
    State(state): State<Arc<AppState>>,
    Path((username, post_id)): Path<(String, String)>,
    OptionalAuth(viewer): OptionalAuth,
    multipart: Multipart,
) -> Result<Response> {
    let post = state
        .post_service
        .get_post_for_author(&username, &post_id)
        .await?;

    let editor = match viewer {
        Some(user) if AuthService::can_edit(Some(&user), &post) => user,
        _ => {
            warn!("Rejected edit of post {} by non-author", post_id);
            return Ok(found(&post_url(&username, &post_id)));
        }
    };

    let form = read_post_form(multipart).await?;
    let request = UpdatePostRequest {
        text: form.text,
        group_id: form.group,
    };
    state
        .post_service
        .update_post(&post.id, &editor.id, request, form.image)
        .await?;

    Ok(found(&post_url(&username, &post_id)))
}

/// GET 请求不创建评论，直接回到帖子页
/// GET /:username/:post_id/comment
async fn comment_redirect(
    Path((username, post_id)): Path<(String, String)>,
    RequiredAuth(_user): RequiredAuth,
) -> Response {
    found(&post_url(&username, &post_id))
}

/// 添加评论，无论是否保存都回到帖子页
/// POST /:username/:post_id/comment
async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path((username, post_id)): Path<(String, String)>,
    RequiredAuth(user): RequiredAuth,
    Form(request): Form<CreateCommentRequest>,
) -> Result<Response> {
    let post = state
        .post_service
        .get_post_for_author(&username, &post_id)
        .await?;

    match state
        .comment_service
        .add_comment(&post.id, &user.id, request)
        .await
    {
        Ok(comment) => debug!("Comment {} saved", comment.id),
        Err(AppError::ValidatorError(e)) => debug!("Comment rejected: {}", e),
        Err(AppError::Validation(msg)) => debug!("Comment rejected: {}", msg),
        Err(e) => return Err(e),
    }

    Ok(found(&post_url(&username, &post_id)))
}

pub fn post_url(username: &str, post_id: &str) -> String {
    format!(
        "/{}/{}/",
        urlencoding::encode(username),
        urlencoding::encode(post_id)
    )
}

/// 新建和编辑共用的表单字段
struct PostForm {
    text: String,
    group: Option<String>,
    image: Option<ImageUpload>,
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm> {
    let mut text = String::new();
    let mut group = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to process multipart field: {}", e);
        AppError::bad_request("无法处理提交的表单")
    })? {
        match field.name().unwrap_or("") {
            "text" => {
                text = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("无法读取帖子内容"))?;
            }
            "group" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("无法读取分组"))?;
                group = normalize_optional(Some(value));
            }
            "image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("无法读取文件数据"))?;

                // 浏览器在未选择文件时也会提交空的文件字段
                if !filename.is_empty() && !data.is_empty() {
                    image = Some(ImageUpload {
                        filename,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            other => debug!("Ignoring form field {}", other),
        }
    }

    Ok(PostForm { text, group, image })
}

/// 渲染帖子列表时缓存作者和分组查询
#[derive(Default)]
pub(crate) struct Lookups {
    usernames: HashMap<String, Option<String>>,
    groups: HashMap<String, Option<Group>>,
}

pub(crate) async fn post_json(state: &AppState, post: &Post, lookups: &mut Lookups) -> Result<Value> {
    if !lookups.usernames.contains_key(&post.author_id) {
        let username = state
            .user_service
            .get_profile(&post.author_id)
            .await
            .ok()
            .map(|profile| profile.username);
        lookups.usernames.insert(post.author_id.clone(), username);
    }

    let group = match &post.group_id {
        Some(group_id) => {
            if !lookups.groups.contains_key(group_id) {
                let group = state.group_service.get_group(group_id).await?;
                lookups.groups.insert(group_id.clone(), group);
            }
            lookups.groups.get(group_id).cloned().flatten()
        }
        None => None,
    };

    Ok(json!({
        "id": post.id,
        "text": post.text,
        "preview": post.preview(),
        "created_at": post.created_at,
        "author": {
            "id": post.author_id,
            "username": lookups.usernames.get(&post.author_id).cloned().flatten()
        },
        "group": group,
        "image": post.image.as_ref().map(|path| format!("/media/{}", path))
    }))
}

pub(crate) async fn page_json(state: &AppState, page: Page<Post>) -> Result<Value> {
    let mut lookups = Lookups::default();
    let mut posts = Vec::with_capacity(page.len());
    for post in &page.items {
        posts.push(post_json(state, post, &mut lookups).await?);
    }

    Ok(json!({
        "posts": posts,
        "pagination": page.pagination
    }))
}

async fn comments_json(state: &AppState, comments: Vec<Comment>) -> Result<Vec<Value>> {
    let mut usernames: HashMap<String, Option<String>> = HashMap::new();
    let mut result = Vec::with_capacity(comments.len());

    for comment in comments {
        if !usernames.contains_key(&comment.author_id) {
            let username = state
                .user_service
                .get_profile(&comment.author_id)
                .await
                .ok()
                .map(|profile| profile.username);
            usernames.insert(comment.author_id.clone(), username);
        }

        result.push(json!({
            "id": comment.id,
            "text": comment.text,
            "created_at": comment.created_at,
            "author": {
                "id": comment.author_id,
                "username": usernames.get(&comment.author_id).cloned().flatten()
            }
        }));
    }

    Ok(result)
}
