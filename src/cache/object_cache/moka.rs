use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::{AppConfig, CacheConfig};
use crate::declare_object_cache_plugin;
use crate::errors::Result;

declare_object_cache_plugin!("moka", MokaObjectCache);

pub struct MokaObjectCache {
    inner: Cache<String, String>,
}

impl MokaObjectCache {
    pub fn new() -> Result<Self> {
        Ok(Self::from_config(&AppConfig::get().cache))
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.memory.max_capacity)
            .time_to_live(std::time::Duration::from_secs(config.default_ttl))
            .build();

        debug!(
            "MokaObjectCache initialized with max capacity: {}",
            config.memory.max_capacity
        );
        Self { inner }
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        if let Some(value) = self.inner.get(key).await {
            debug!("Cache hit: {}", key);
            CacheResult::Found(value)
        } else {
            debug!("Cache miss: {}", key);
            CacheResult::NotFound
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        // 全局 TTL 在构建时确定，单条 TTL 不生效
        if ttl != 0 {
            debug!("Moka cache ignores per-item TTL for {}", key);
        }
        self.inner.insert(key, value).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}
