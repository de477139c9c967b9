use crate::{
    error::{AppError, Result},
    models::user::UserProfile,
    services::{Database, MediaService},
    utils::validation::validate_username,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    media: MediaService,
}

impl UserService {
    /// 创建新的用户服务实例
    pub async fn new(db: Arc<Database>, media: MediaService) -> Result<Self> {
        Ok(Self { db, media })
    }

    /// 创建新用户资料
    pub async fn create_profile(&self, username: &str) -> Result<UserProfile> {
        self.insert_profile(&Uuid::new_v4().to_string(), username).await
    }

    /// 确保已认证用户在本地有资料；用户名变化时同步更新
    pub async fn ensure_profile(&self, user_id: &str, username: &str) -> Result<UserProfile> {
        if let Some(existing) = self.find_profile(user_id).await? {
            if existing.username == username {
                return Ok(existing);
            }

            debug!("Syncing username for user {}: {} -> {}", user_id, existing.username, username);
            let mut response = self
                .db
                .query_with_params(
                    "UPDATE type::thing('user', $id) SET username = $username RETURN AFTER",
                    json!({ "id": user_id, "username": username }),
                )
                .await?;
            let updated: Vec<UserProfile> = response.take(0)?;
            return updated
                .into_iter()
                .next()
                .ok_or_else(|| AppError::not_found("User"));
        }

        match self.insert_profile(user_id, username).await {
            Ok(profile) => Ok(profile),
            // 并发请求可能已经创建了资料
            Err(e) => match self.find_profile(user_id).await? {
                Some(profile) => Ok(profile),
                None => Err(e),
            },
        }
    }

    async fn insert_profile(&self, user_id: &str, username: &str) -> Result<UserProfile> {
        debug!("Creating user profile {} ({})", username, user_id);
        validate_username(username)?;

        let result = self
            .db
            .query_with_params(
                r#"
                    CREATE type::thing('user', $id) SET
                        username = $username,
                        created_at = <datetime> $created_at
                "#,
                json!({
                    "id": user_id,
                    "username": username,
                    "created_at": Utc::now(),
                }),
            )
            .await;

        let mut response = match result {
            Ok(response) => response,
            Err(AppError::Database(e)) if AppError::is_unique_violation(&e) => {
                warn!("Username already taken: {}", username);
                return Err(AppError::Conflict(format!("Username '{}' is already taken", username)));
            }
            Err(e) => return Err(e),
        };

        let created: Vec<UserProfile> = response.take(0)?;
        let profile = created
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Failed to create user profile"))?;

        info!("Created user profile {} ({})", profile.username, profile.id);
        Ok(profile)
    }

    async fn find_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.db.get_by_id("user", user_id).await
    }

    /// 根据ID获取用户资料
    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        self.find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 根据用户名获取用户资料
    pub async fn get_profile_by_username(&self, username: &str) -> Result<UserProfile> {
        debug!("Getting user profile by username: {}", username);

        self.db
            .find_one("user", "username", username)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 删除用户及其关注关系、评论、帖子（含帖子下的评论）
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        debug!("Deleting user: {}", user_id);

        // 确认用户存在
        self.get_profile(user_id).await?;

        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM post WHERE author_id = $user_id",
                json!({ "user_id": user_id }),
            )
            .await?;
        let post_ids: Vec<String> = response
            .take::<Vec<crate::models::post::Post>>(0)?
            .into_iter()
            .map(|post| post.id)
            .collect();

        self.db
            .query_with_params(
                r#"
                    BEGIN TRANSACTION;
                    DELETE follow WHERE follower_id = $user_id OR followed_id = $user_id;
                    DELETE comment WHERE author_id = $user_id OR post_id INSIDE $post_ids;
                    DELETE post WHERE author_id = $user_id;
                    DELETE type::thing('user', $user_id);
                    COMMIT TRANSACTION;
                "#,
                json!({ "user_id": user_id, "post_ids": post_ids }),
            )
            .await?;

        for post_id in &post_ids {
            if let Err(e) = self.media.delete_post_images(post_id).await {
                warn!("Failed to remove images for post {}: {}", post_id, e);
            }
        }

        info!("Deleted user {} and {} posts", user_id, post_ids.len());
        Ok(())
    }
}
