#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use rainbow_posts::{
    config::Config,
    models::{
        group::{CreateGroupRequest, Group},
        post::{CreatePostRequest, Post},
        user::UserProfile,
    },
    routes,
    state::AppState,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

/// 每个测试使用独立的内存数据库和临时媒体目录
pub fn test_config() -> Config {
    let media_root = std::env::temp_dir().join(format!("rainbow-posts-test-{}", uuid::Uuid::new_v4()));
    Config {
        media_root: media_root.to_string_lossy().to_string(),
        ..Config::default()
    }
}

pub async fn test_state() -> Arc<AppState> {
    test_state_with(test_config()).await
}

pub async fn test_state_with(config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(config).await.expect("test state"))
}

pub fn test_app(state: &Arc<AppState>) -> Router {
    routes::app(state.clone())
}

pub async fn user(state: &AppState, username: &str) -> UserProfile {
    state
        .user_service
        .create_profile(username)
        .await
        .expect("create user")
}

pub fn token_for(state: &AppState, user: &UserProfile) -> String {
    state
        .auth_service
        .issue_token(&user.id, &user.username)
        .expect("issue token")
}

pub async fn group(state: &AppState, title: &str, slug: &str) -> Group {
    state
        .group_service
        .create_group(CreateGroupRequest {
            title: title.to_string(),
            slug: Some(slug.to_string()),
            description: String::new(),
        })
        .await
        .expect("create group")
}

pub async fn post(state: &AppState, author: &UserProfile, text: &str, group_id: Option<&str>) -> Post {
    let created = state
        .post_service
        .create_post(
            &author.id,
            CreatePostRequest {
                text: text.to_string(),
                group_id: group_id.map(str::to_string),
            },
            None,
        )
        .await
        .expect("create post");
    // 保证创建时间严格递增
    tokio::time::sleep(Duration::from_millis(2)).await;
    created
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = hyper::body::to_bytes(response.into_body())
        .await
        .expect("body")
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_form(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

const BOUNDARY: &str = "rainbow-posts-boundary";

/// 构造 multipart/form-data 请求，file 为 (文件名, 内容)
pub fn post_multipart(
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder().method("POST").uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).expect("request")
}
