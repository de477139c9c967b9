use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheItem<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// 简单的内存缓存实现，按键设置过期时间
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<String, CacheItem<T>>>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    /// 创建新的缓存实例
    pub fn new(default_ttl: Duration) -> Self {
        let cache = Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        };

        // 启动后台清理任务（仅在 tokio 运行时中）
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let data_ref = Arc::downgrade(&cache.data);
            handle.spawn(async move {
                loop {
                    sleep(Duration::from_secs(60)).await;
                    match data_ref.upgrade() {
                        Some(data) => Self::cleanup_expired(&data),
                        None => break,
                    }
                }
            });
        }

        cache
    }

    /// 设置缓存项
    pub fn set(&self, key: String, value: T) {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// 设置带有自定义TTL的缓存项
    pub fn set_with_ttl(&self, key: String, value: T, ttl: Duration) {
        let item = CacheItem {
            value,
            expires_at: Instant::now() + ttl,
        };

        self.data.write().insert(key, item);
    }

    /// 获取缓存项，过期的项视为不存在
    pub fn get(&self, key: &str) -> Option<T> {
        let data = self.data.read();
        data.get(key)
            .filter(|item| item.is_fresh(Instant::now()))
            .map(|item| item.value.clone())
    }

    /// 删除缓存项
    pub fn delete(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// 获取缓存大小（包含尚未清理的过期项）
    pub fn size(&self) -> usize {
        self.data.read().len()
    }

    /// 检查键是否存在且未过期
    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 清理过期项
    fn cleanup_expired(data: &RwLock<HashMap<String, CacheItem<T>>>) {
        let now = Instant::now();
        data.write().retain(|_, item| item.is_fresh(now));
    }
}

/// 渲染后页面的缓存
pub type PageCache = Cache<Vec<u8>>;

/// 生成页面缓存键，键由页面标识和页码组成
pub fn page_key(page: &str, page_number: &str) -> String {
    format!("{}:page:{}", page, page_number)
}

/// 缓存辅助宏
#[macro_export]
macro_rules! cache_get_or_set_async {
    ($cache:expr, $key:expr, $compute:expr) => {{
        match $cache.get($key) {
            Some(value) => Ok(value),
            None => match $compute.await {
                Ok(computed_value) => {
                    $cache.set($key.to_string(), computed_value.clone());
                    Ok(computed_value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
