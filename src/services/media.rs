use crate::{
    config::Config,
    error::{AppError, Result},
    models::media::{ImageUpload, MediaUploadResponse},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// 帖子图片的本地文件存储
#[derive(Clone)]
pub struct MediaService {
    media_root: PathBuf,
    max_upload_size: usize,
}

impl MediaService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            media_root: PathBuf::from(&config.media_root),
            max_upload_size: config.max_upload_size,
        })
    }

    /// 保存帖子图片，返回相对于媒体目录的路径 posts/<post_id>/<filename>
    pub async fn save_post_image(&self, post_id: &str, upload: &ImageUpload) -> Result<MediaUploadResponse> {
        debug!(
            "Saving image for post {}: {} ({} bytes)",
            post_id,
            upload.filename,
            upload.data.len()
        );

        if upload.data.is_empty() {
            return Err(AppError::FileUpload("上传的文件为空".to_string()));
        }

        if upload.data.len() > self.max_upload_size {
            return Err(AppError::FileUpload(format!(
                "文件大小超过限制（最大 {} 字节）",
                self.max_upload_size
            )));
        }

        let filename = sanitize_filename(&upload.filename);
        if !is_raster_image(&filename) {
            return Err(AppError::FileUpload(format!(
                "不支持的图片格式，仅允许 {}",
                RASTER_EXTENSIONS.join(", ")
            )));
        }

        let relative = format!("posts/{}/{}", post_id, filename);
        let full_path = self.media_root.join(&relative);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full_path, &upload.data).await?;

        info!("Stored image {}", relative);

        Ok(MediaUploadResponse {
            url: format!("/media/{}", relative),
            path: relative,
            size: upload.data.len(),
        })
    }

    /// 读取媒体文件
    pub async fn get_file(&self, relative: &str) -> Result<Vec<u8>> {
        let path = self.resolve(relative)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found("File")),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除帖子的所有图片
    pub async fn delete_post_images(&self, post_id: &str) -> Result<()> {
        let dir = self.resolve(&format!("posts/{}", post_id))?;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Failed to remove images for post {}: {}", post_id, e);
                Err(e.into())
            }
        }
    }

    /// 只允许媒体目录内的普通相对路径
    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        let is_safe = !relative.is_empty()
            && path.components().all(|c| matches!(c, Component::Normal(_)));

        if !is_safe {
            return Err(AppError::bad_request("Invalid media path"));
        }

        Ok(self.media_root.join(path))
    }
}

/// 文件名只保留字母、数字、点、连字符和下划线
fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(&['/', '\\'][..]).next().unwrap_or_default();

    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// 允许上传的位图格式
const RASTER_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

fn file_extension(file_path: &str) -> String {
    match file_path.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

fn is_raster_image(filename: &str) -> bool {
    RASTER_EXTENSIONS.contains(&file_extension(filename).as_str())
}

/// 根据文件扩展名确定内容类型
pub fn determine_content_type(file_path: &str) -> &'static str {
    let extension = file_extension(file_path);

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
