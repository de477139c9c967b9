use crate::{error::AppError, services::auth::User, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    headers::{authorization::Bearer, Authorization, Cookie, HeaderMapExt},
    http::{header, request::Parts, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 保存访问令牌的 cookie 名
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// 认证中间件。令牌无效或缺失时按匿名请求继续处理
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(request.headers()) {
        match app_state.auth_service.verify_jwt(&token) {
            Ok(claims) => {
                // 确保用户的 profile 存在
                match app_state
                    .user_service
                    .ensure_profile(&claims.sub, &claims.username)
                    .await
                {
                    Ok(profile) => {
                        debug!("Authenticated user: {} ({})", profile.username, profile.id);
                        request.extensions_mut().insert(User {
                            id: profile.id,
                            username: profile.username,
                        });
                    }
                    Err(e) => {
                        warn!("Failed to ensure user profile exists for user {}: {}", claims.sub, e);
                    }
                }
            }
            Err(e) => {
                debug!("JWT verification failed: {}", e);
            }
        }
    }

    Ok(next.run(request).await)
}

/// 请求日志中间件
pub async fn request_logging_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start_time = std::time::Instant::now();

    debug!("Incoming request: {} {}", method, uri);

    let response = next.run(request).await;

    info!(
        "Request completed: {} {} {} - {}ms",
        method,
        uri,
        response.status().as_u16(),
        start_time.elapsed().as_millis()
    );

    response
}

/// 先取 Authorization: Bearer，再取 access_token cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(ACCESS_TOKEN_COOKIE).map(str::to_string))
        .filter(|token| !token.is_empty())
}

/// 302 跳转
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => AppError::internal("Invalid redirect location").into_response(),
    }
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<User>().cloned()))
    }
}

/// 必须登录的提取器，未登录时跳转到登录页
pub struct RequiredAuth(pub User);

/// 跳转到登录页，next 指向原请求路径
pub struct LoginRedirect(pub String);

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        found(&self.0)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequiredAuth {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<User>() {
            Some(user) => Ok(RequiredAuth(user.clone())),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
                debug!("Anonymous request to {} redirected to login", next);
                Err(LoginRedirect(state.auth_service.login_redirect_url(next)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_prefers_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=xyz"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_found_sets_location() {
        let response = found("/auth/login/?next=/new/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/new/"
        );
    }
}
