use crate::utils::serde_helpers::thing_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(with = "thing_id")]
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[serde(default)]
    #[validate(custom = "crate::utils::validation::validate_not_blank")]
    pub text: String,
}
