use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::{Response, Surreal};
use tracing::{debug, error, info};

/// 表结构与索引。关注关系的唯一性由存储层的唯一索引保证。
const SCHEMA: &str = r#"
    DEFINE TABLE user SCHEMALESS;
    DEFINE INDEX user_username ON TABLE user FIELDS username UNIQUE;

    DEFINE TABLE post_group SCHEMALESS;
    DEFINE INDEX post_group_slug ON TABLE post_group FIELDS slug UNIQUE;

    DEFINE TABLE post SCHEMALESS;
    DEFINE INDEX post_created_at ON TABLE post FIELDS created_at;
    DEFINE INDEX post_author ON TABLE post FIELDS author_id;
    DEFINE INDEX post_group_id ON TABLE post FIELDS group_id;

    DEFINE TABLE comment SCHEMALESS;
    DEFINE INDEX comment_post ON TABLE comment FIELDS post_id;

    DEFINE TABLE follow SCHEMALESS;
    DEFINE INDEX follow_pair ON TABLE follow FIELDS follower_id, followed_id UNIQUE;
"#;

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub client: Surreal<Any>,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库实例并初始化表结构
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let client = any::connect(config.database_url.as_str()).await?;

        // 内嵌引擎不需要登录
        if !config.uses_embedded_database() {
            client
                .signin(Root {
                    username: config.database_username.as_str(),
                    password: config.database_password.as_str(),
                })
                .await?;
        }

        client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        let db = Self {
            client,
            config: config.clone(),
        };
        db.define_schema().await?;

        Ok(db)
    }

    /// 定义表和索引
    async fn define_schema(&self) -> Result<()> {
        debug!("Applying database schema");
        self.client.query(SCHEMA).await?.check()?;
        Ok(())
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await.and_then(Response::check) {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// 执行原始查询，任何一条语句失败都返回错误
    pub async fn query(&self, sql: &str) -> Result<Response> {
        let response = self.client.query(sql).await?.check()?;
        Ok(response)
    }

    /// 执行带参数的查询，任何一条语句失败都返回错误
    pub async fn query_with_params<P>(&self, sql: &str, params: P) -> Result<Response>
    where
        P: Serialize,
    {
        let response = self.client.query(sql).bind(params).await?.check()?;
        Ok(response)
    }

    /// 通过ID获取单个记录
    pub async fn get_by_id<T>(&self, table: &str, id: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut response = self
            .query_with_params(
                "SELECT * FROM type::thing($table, $id)",
                json!({ "table": table, "id": id }),
            )
            .await?;
        let results: Vec<T> = response.take(0)?;
        Ok(results.into_iter().next())
    }

    /// 按字段查找单个记录（表名和字段名只能是内部常量）
    pub async fn find_one<T>(&self, table: &str, field: &str, value: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let query = format!("SELECT * FROM {} WHERE {} = $needle LIMIT 1", table, field);
        debug!("Executing query: {}", query);

        let mut response = self
            .query_with_params(&query, json!({ "needle": value }))
            .await?;
        let results: Vec<T> = response.take(0)?;
        Ok(results.into_iter().next())
    }

    /// 统计查询，SQL 需以 `SELECT count() AS count ... GROUP ALL` 的形式返回一行
    pub async fn count<P>(&self, sql: &str, params: P) -> Result<i64>
    where
        P: Serialize,
    {
        let mut response = self.query_with_params(sql, params).await?;
        let row: Option<CountRow> = response.take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}
