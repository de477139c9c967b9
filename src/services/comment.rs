use crate::{
    error::{AppError, Result},
    models::{
        comment::{Comment, CreateCommentRequest},
        post::Post,
    },
    services::Database,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 为帖子添加评论；帖子不存在时视为校验错误
    pub async fn add_comment(
        &self,
        post_id: &str,
        author_id: &str,
        request: CreateCommentRequest,
    ) -> Result<Comment> {
        debug!("Adding comment to post {} by {}", post_id, author_id);

        request.validate()?;

        let post: Option<Post> = self.db.get_by_id("post", post_id).await?;
        if post.is_none() {
            return Err(AppError::validation("Post does not exist"));
        }

        let mut response = self
            .db
            .query_with_params(
                r#"
                    CREATE type::thing('comment', $id) SET
                        post_id = $post_id,
                        author_id = $author_id,
                        text = $text,
                        created_at = <datetime> $created_at
                "#,
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "post_id": post_id,
                    "author_id": author_id,
                    "text": request.text,
                    "created_at": Utc::now(),
                }),
            )
            .await?;

        let created: Vec<Comment> = response.take(0)?;
        let comment = created
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Failed to create comment"))?;

        info!("Created comment {} on post {}", comment.id, post_id);
        Ok(comment)
    }

    /// 帖子的评论，最早的在前
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM comment WHERE post_id = $post_id ORDER BY created_at ASC",
                json!({ "post_id": post_id }),
            )
            .await?;
        let comments: Vec<Comment> = response.take(0)?;
        Ok(comments)
    }
}
