use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub login_url: String,

    // Content settings
    pub posts_per_page: usize,
    pub index_cache_ttl: u64,

    // Storage configuration
    pub media_root: String,
    pub max_upload_size: usize,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "rainbow_posts=debug,tower_http=debug".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "rainbow".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "posts".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()?,
            login_url: env::var("LOGIN_URL")
                .unwrap_or_else(|_| "/auth/login/".to_string()),

            posts_per_page: env::var("POSTS_PER_PAGE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            index_cache_ttl: env::var("INDEX_CACHE_TTL")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "5242880".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 是否使用内嵌内存数据库
    pub fn uses_embedded_database(&self) -> bool {
        self.database_url.starts_with("mem://")
    }
}

/// 本地开发和测试使用的默认配置（内存数据库）
impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            database_url: "mem://".to_string(),
            database_namespace: "rainbow".to_string(),
            database_name: "posts".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            jwt_secret: "development-secret".to_string(),
            jwt_expiry_hours: 168,
            login_url: "/auth/login/".to_string(),
            posts_per_page: 10,
            index_cache_ttl: 20,
            media_root: "media".to_string(),
            max_upload_size: 5 * 1024 * 1024,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}
