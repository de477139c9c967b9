use crate::utils::serde_helpers::thing_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(with = "thing_id")]
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: String,
    #[serde(default)]
    pub group_id: Option<String>,
    /// 相对于媒体目录的图片路径，例如 posts/<post_id>/cat.png
    #[serde(default)]
    pub image: Option<String>,
}

impl Post {
    /// 列表中展示的简短预览
    pub fn preview(&self) -> String {
        self.text.chars().take(15).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(custom = "crate::utils::validation::validate_not_blank")]
    pub text: String,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(custom = "crate::utils::validation::validate_not_blank")]
    pub text: String,
    /// None 表示移出分组
    pub group_id: Option<String>,
}
