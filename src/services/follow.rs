use crate::{
    error::{AppError, Result},
    models::{
        follow::{Follow, FollowStats},
        user::UserProfile,
    },
    services::Database,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
}

impl FollowService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 建立关注关系，已存在时不做任何事。
    /// 返回是否新建了关系。重复关系由唯一索引拒绝，不在应用层先查后写。
    pub async fn follow(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        debug!("User {} following user {}", follower_id, followed_id);

        if follower_id == followed_id {
            return Err(AppError::validation("Cannot follow yourself"));
        }

        let followed: Option<UserProfile> = self.db.get_by_id("user", followed_id).await?;
        if followed.is_none() {
            return Err(AppError::not_found("User"));
        }

        let result = self
            .db
            .query_with_params(
                r#"
                    CREATE type::thing('follow', $id) SET
                        follower_id = $follower_id,
                        followed_id = $followed_id,
                        created_at = <datetime> $created_at
                "#,
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "follower_id": follower_id,
                    "followed_id": followed_id,
                    "created_at": Utc::now(),
                }),
            )
            .await;

        match result {
            Ok(_) => {
                info!("User {} followed user {}", follower_id, followed_id);
                Ok(true)
            }
            Err(AppError::Database(e)) if AppError::is_unique_violation(&e) => {
                debug!("User {} already follows user {}", follower_id, followed_id);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// 取消关注，关系不存在时返回 NotFound
    pub async fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        debug!("User {} unfollowing user {}", follower_id, followed_id);

        let mut response = self
            .db
            .query_with_params(
                r#"
                    DELETE follow
                    WHERE follower_id = $follower_id AND followed_id = $followed_id
                    RETURN BEFORE
                "#,
                json!({
                    "follower_id": follower_id,
                    "followed_id": followed_id,
                }),
            )
            .await?;
        let removed: Vec<Follow> = response.take(0)?;

        if removed.is_empty() {
            return Err(AppError::not_found("Follow"));
        }

        info!("User {} unfollowed user {}", follower_id, followed_id);
        Ok(())
    }

    pub async fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        let count = self
            .db
            .count(
                r#"
                    SELECT count() AS count FROM follow
                    WHERE follower_id = $follower_id AND followed_id = $followed_id
                    GROUP ALL
                "#,
                json!({
                    "follower_id": follower_id,
                    "followed_id": followed_id,
                }),
            )
            .await?;
        Ok(count > 0)
    }

    /// 关注该用户的人数
    pub async fn follower_count(&self, user_id: &str) -> Result<i64> {
        self.db
            .count(
                "SELECT count() AS count FROM follow WHERE followed_id = $user_id GROUP ALL",
                json!({ "user_id": user_id }),
            )
            .await
    }

    /// 该用户关注的人数
    pub async fn following_count(&self, user_id: &str) -> Result<i64> {
        self.db
            .count(
                "SELECT count() AS count FROM follow WHERE follower_id = $user_id GROUP ALL",
                json!({ "user_id": user_id }),
            )
            .await
    }

    /// 该用户关注的所有用户ID
    pub async fn following_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let edges = self.edges("follower_id", user_id).await?;
        Ok(edges.into_iter().map(|f| f.followed_id).collect())
    }

    /// 关注该用户的所有用户ID
    pub async fn follower_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let edges = self.edges("followed_id", user_id).await?;
        Ok(edges.into_iter().map(|f| f.follower_id).collect())
    }

    /// 资料页展示的关注统计
    pub async fn stats(&self, user_id: &str, viewer_id: Option<&str>) -> Result<FollowStats> {
        let is_following = match viewer_id {
            Some(viewer) if viewer != user_id => self.is_following(viewer, user_id).await?,
            _ => false,
        };

        Ok(FollowStats {
            followers_count: self.follower_count(user_id).await?,
            following_count: self.following_count(user_id).await?,
            is_following,
        })
    }

    async fn edges(&self, field: &str, user_id: &str) -> Result<Vec<Follow>> {
        let query = format!(
            "SELECT * FROM follow WHERE {} = $user_id ORDER BY created_at DESC",
            field
        );
        let mut response = self
            .db
            .query_with_params(&query, json!({ "user_id": user_id }))
            .await?;
        let edges: Vec<Follow> = response.take(0)?;
        Ok(edges)
    }
}
