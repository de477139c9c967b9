use crate::{
    error::{AppError, Result},
    models::group::{CreateGroupRequest, Group},
    services::Database,
    utils::slug::{generate_slug, is_valid_slug, make_slug_unique},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct GroupService {
    db: Arc<Database>,
}

impl GroupService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 创建分组。未提供 slug 时根据标题生成并保证唯一；显式给出的重复 slug 视为校验错误
    pub async fn create_group(&self, request: CreateGroupRequest) -> Result<Group> {
        debug!("Creating group: {}", request.title);

        request.validate()?;

        let slug = match request.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => {
                if !is_valid_slug(slug) {
                    return Err(AppError::validation(
                        "Slug may contain only letters, digits, hyphens and underscores (max 50)",
                    ));
                }
                if self.slug_exists(slug).await? {
                    return Err(AppError::validation(&format!(
                        "Group with slug '{}' already exists",
                        slug
                    )));
                }
                slug.to_string()
            }
            None => {
                let base = generate_slug(&request.title);
                let existing = self.slugs_with_prefix(&base).await?;
                make_slug_unique(&base, &existing)
            }
        };

        let result = self
            .db
            .query_with_params(
                r#"
                    CREATE type::thing('post_group', $id) SET
                        title = $title,
                        slug = $slug,
                        description = $description
                "#,
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "title": request.title.trim(),
                    "slug": slug,
                    "description": request.description,
                }),
            )
            .await;

        let mut response = match result {
            Ok(response) => response,
            Err(AppError::Database(e)) if AppError::is_unique_violation(&e) => {
                warn!("Group slug collision: {}", slug);
                return Err(AppError::validation(&format!(
                    "Group with slug '{}' already exists",
                    slug
                )));
            }
            Err(e) => return Err(e),
        };

        let created: Vec<Group> = response.take(0)?;
        let group = created
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Failed to create group"))?;

        info!("Created group {} ({})", group.slug, group.id);
        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        self.db.get_by_id("post_group", group_id).await
    }

    /// 根据 slug 获取分组，不存在时返回 NotFound
    pub async fn get_group_by_slug(&self, slug: &str) -> Result<Group> {
        debug!("Getting group by slug: {}", slug);

        self.db
            .find_one("post_group", "slug", slug)
            .await?
            .ok_or_else(|| AppError::not_found("Group"))
    }

    /// 所有分组，按标题排序
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let mut response = self
            .db
            .query("SELECT * FROM post_group ORDER BY title ASC")
            .await?;
        let groups: Vec<Group> = response.take(0)?;
        Ok(groups)
    }

    /// 删除分组；组内帖子保留，但不再属于任何分组
    pub async fn delete_group(&self, group_id: &str) -> Result<()> {
        debug!("Deleting group: {}", group_id);

        if self.get_group(group_id).await?.is_none() {
            return Err(AppError::not_found("Group"));
        }

        self.db
            .query_with_params(
                r#"
                    BEGIN TRANSACTION;
                    UPDATE post SET group_id = NONE WHERE group_id = $group_id;
                    DELETE type::thing('post_group', $group_id);
                    COMMIT TRANSACTION;
                "#,
                json!({ "group_id": group_id }),
            )
            .await?;

        info!("Deleted group {}", group_id);
        Ok(())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let existing: Option<Group> = self.db.find_one("post_group", "slug", slug).await?;
        Ok(existing.is_some())
    }

    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM post_group WHERE slug = $base OR string::startsWith(slug, $base + '-')",
                json!({ "base": base }),
            )
            .await?;
        let groups: Vec<Group> = response.take(0)?;
        Ok(groups.into_iter().map(|g| g.slug).collect())
    }
}
