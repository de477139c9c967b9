use crate::utils::serde_helpers::thing_id;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 帖子分组（话题）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(with = "thing_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(
        custom = "crate::utils::validation::validate_not_blank",
        length(max = 200, message = "Title must be at most 200 characters")
    )]
    pub title: String,
    /// 为空时根据标题生成
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}
