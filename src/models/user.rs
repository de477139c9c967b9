use crate::utils::serde_helpers::thing_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 本地用户资料，身份信息来自外部认证服务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(with = "thing_id")]
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
