use crate::{
    config::Config,
    error::{AppError, Result},
    models::post::Post,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AuthService {
    config: Config,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // 用户ID
    pub username: String, // 用户名
    pub exp: i64,         // 过期时间
    pub iat: i64,         // 签发时间
}

/// 当前请求的已认证用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

impl AuthService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    /// 签发访问令牌（供外部登录流程和测试使用）
    pub fn issue_token(&self, user_id: &str, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.jwt_expiry_hours)).timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;
        Ok(token)
    }

    /// 登录页地址，携带登录后返回的路径
    pub fn login_redirect_url(&self, next: &str) -> String {
        let next = urlencoding::encode(next).replace("%2F", "/");
        format!("{}?next={}", self.config.login_url, next)
    }

    /// 只有作者本人可以编辑帖子
    pub fn can_edit(viewer: Option<&User>, post: &Post) -> bool {
        viewer.map_or(false, |user| user.id == post.author_id)
    }

    /// 只有已登录用户可以评论
    pub fn can_comment(viewer: Option<&User>) -> bool {
        viewer.is_some()
    }
}
