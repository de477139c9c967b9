use crate::{
    error::{AppError, Result},
    models::{
        media::ImageUpload,
        post::{CreatePostRequest, Post, UpdatePostRequest},
    },
    services::{Database, GroupService, MediaService, UserService},
    utils::validation::normalize_optional,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    groups: GroupService,
    users: UserService,
    media: MediaService,
}

impl PostService {
    pub async fn new(
        db: Arc<Database>,
        groups: GroupService,
        users: UserService,
        media: MediaService,
    ) -> Result<Self> {
        Ok(Self {
            db,
            groups,
            users,
            media,
        })
    }

    /// 创建帖子，created_at 取当前时间
    pub async fn create_post(
        &self,
        author_id: &str,
        request: CreatePostRequest,
        image: Option<ImageUpload>,
    ) -> Result<Post> {
        debug!("Creating post for author: {}", author_id);

        request.validate()?;
        let group_id = self.resolve_group(request.group_id).await?;

        let post_id = Uuid::new_v4().to_string();
        let image_path = match &image {
            Some(upload) => Some(self.media.save_post_image(&post_id, upload).await?.path),
            None => None,
        };

        let result = self
            .db
            .query_with_params(
                r#"
                    CREATE type::thing('post', $id) SET
                        text = $text,
                        created_at = <datetime> $created_at,
                        author_id = $author_id,
                        group_id = $group_id,
                        image = $image
                "#,
                json!({
                    "id": post_id,
                    "text": request.text,
                    "created_at": Utc::now(),
                    "author_id": author_id,
                    "group_id": group_id,
                    "image": image_path,
                }),
            )
            .await;

        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                if image_path.is_some() {
                    if let Err(cleanup) = self.media.delete_post_images(&post_id).await {
                        warn!("Failed to clean up images of unsaved post {}: {}", post_id, cleanup);
                    }
                }
                return Err(e);
            }
        };

        let created: Vec<Post> = response.take(0)?;
        let post = created
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Failed to create post"))?;

        info!("Created post {} by {}", post.id, author_id);
        Ok(post)
    }

    /// 根据ID获取帖子
    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        self.db
            .get_by_id("post", post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// 获取属于指定用户名作者的帖子
    pub async fn get_post_for_author(&self, username: &str, post_id: &str) -> Result<Post> {
        let author = self.users.get_profile_by_username(username).await?;
        let post = self.get_post(post_id).await?;

        if post.author_id != author.id {
            return Err(AppError::not_found("Post"));
        }

        Ok(post)
    }

    /// 所有帖子，最新的在前
    pub async fn list_all_posts(&self) -> Result<Vec<Post>> {
        let mut response = self
            .db
            .query("SELECT * FROM post ORDER BY created_at DESC")
            .await?;
        let posts: Vec<Post> = response.take(0)?;
        Ok(posts)
    }

    pub async fn list_posts_by_group(&self, group_id: &str) -> Result<Vec<Post>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM post WHERE group_id = $group_id ORDER BY created_at DESC",
                json!({ "group_id": group_id }),
            )
            .await?;
        let posts: Vec<Post> = response.take(0)?;
        Ok(posts)
    }

    pub async fn list_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM post WHERE author_id = $author_id ORDER BY created_at DESC",
                json!({ "author_id": author_id }),
            )
            .await?;
        let posts: Vec<Post> = response.take(0)?;
        Ok(posts)
    }

    /// 一组作者的帖子，最新的在前
    pub async fn list_posts_by_authors(&self, author_ids: &[String]) -> Result<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM post WHERE author_id INSIDE $author_ids ORDER BY created_at DESC",
                json!({ "author_ids": author_ids }),
            )
            .await?;
        let posts: Vec<Post> = response.take(0)?;
        Ok(posts)
    }

    pub async fn count_posts_by_author(&self, author_id: &str) -> Result<i64> {
        self.db
            .count(
                "SELECT count() AS count FROM post WHERE author_id = $author_id GROUP ALL",
                json!({ "author_id": author_id }),
            )
            .await
    }

    /// 编辑帖子。只有作者可以编辑；作者和创建时间保持不变，未上传新图片时保留原图
    pub async fn update_post(
        &self,
        post_id: &str,
        editor_id: &str,
        request: UpdatePostRequest,
        image: Option<ImageUpload>,
    ) -> Result<Post> {
        debug!("Updating post {} by {}", post_id, editor_id);

        let post = self.get_post(post_id).await?;
        if post.author_id != editor_id {
            warn!("User {} tried to edit post {} owned by {}", editor_id, post_id, post.author_id);
            return Err(AppError::Authorization(
                "Only the author can edit this post".to_string(),
            ));
        }

        request.validate()?;
        let group_id = self.resolve_group(request.group_id).await?;

        let image_path = match &image {
            Some(upload) => Some(self.media.save_post_image(post_id, upload).await?.path),
            None => post.image.clone(),
        };

        let mut response = self
            .db
            .query_with_params(
                r#"
                    UPDATE type::thing('post', $id) SET
                        text = $text,
                        group_id = $group_id,
                        image = $image
                    RETURN AFTER
                "#,
                json!({
                    "id": post_id,
                    "text": request.text,
                    "group_id": group_id,
                    "image": image_path,
                }),
            )
            .await?;

        let updated: Vec<Post> = response.take(0)?;
        let updated = updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("Post"))?;

        info!("Updated post {}", post_id);
        Ok(updated)
    }

    /// 删除帖子及其评论和图片
    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        debug!("Deleting post: {}", post_id);

        self.get_post(post_id).await?;

        self.db
            .query_with_params(
                r#"
                    BEGIN TRANSACTION;
                    DELETE comment WHERE post_id = $post_id;
                    DELETE type::thing('post', $post_id);
                    COMMIT TRANSACTION;
                "#,
                json!({ "post_id": post_id }),
            )
            .await?;

        if let Err(e) = self.media.delete_post_images(post_id).await {
            warn!("Post {} deleted but its images remain: {}", post_id, e);
        }

        info!("Deleted post {}", post_id);
        Ok(())
    }

    /// 分组必须存在；空白视为不分组
    async fn resolve_group(&self, group_id: Option<String>) -> Result<Option<String>> {
        match normalize_optional(group_id) {
            Some(id) => match self.groups.get_group(&id).await? {
                Some(group) => Ok(Some(group.id)),
                None => Err(AppError::validation("Selected group does not exist")),
            },
            None => Ok(None),
        }
    }
}
