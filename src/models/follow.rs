use crate::utils::serde_helpers::thing_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 关注关系：follower 关注 followed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    #[serde(with = "thing_id")]
    pub id: String,
    pub follower_id: String,
    pub followed_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStats {
    pub followers_count: i64,
    pub following_count: i64,
    /// 当前访问者是否已关注该用户
    pub is_following: bool,
}
