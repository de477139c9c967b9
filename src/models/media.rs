use serde::{Deserialize, Serialize};

/// 表单上传的图片
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub path: String,
    pub url: String,
    pub size: usize,
}
