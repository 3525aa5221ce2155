use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::{debug, error, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;
use crate::errors::{GradebookError, Result};

declare_object_cache_plugin!("redis", RedisObjectCache);

pub struct RedisObjectCache {
    client: redis::Client,
    key_prefix: String,
    ttl: u64, // 秒
}

impl RedisObjectCache {
    pub fn new() -> Result<Self> {
        let config = AppConfig::get();
        let redis_config = &config.cache.redis;

        let client = redis::Client::open(redis_config.url.clone()).map_err(|e| {
            GradebookError::cache_connection(format!("invalid redis url: {e}"))
        })?;

        // 启动时同步 PING 一次
        let mut conn = client.get_connection().map_err(|e| {
            error!(
                "Failed to connect to Redis at {}: {}",
                redis_config.url, e
            );
            GradebookError::cache_connection(format!("redis connection failed: {e}"))
        })?;
        let pong: String = redis::cmd("PING").query(&mut conn).map_err(|e| {
            error!("Failed to ping Redis server at {}: {}", redis_config.url, e);
            GradebookError::cache_connection(format!("redis ping failed: {e}"))
        })?;
        debug!(
            "Redis cache ready ({}), prefix '{}', TTL {}s",
            pong, redis_config.key_prefix, config.cache.default_ttl
        );

        Ok(Self {
            client,
            key_prefix: redis_config.key_prefix.clone(),
            ttl: config.cache.default_ttl,
        })
    }

    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return CacheResult::ExistsButNoValue;
            }
        };

        let result: redis::RedisResult<Option<String>> = conn.get(self.make_key(key)).await;
        match result {
            Ok(Some(data)) => {
                debug!("Cache hit: {}", key);
                CacheResult::Found(data)
            }
            Ok(None) => {
                debug!("Cache miss: {}", key);
                CacheResult::NotFound
            }
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return;
            }
        };

        let effective_ttl = if ttl == 0 { self.ttl } else { ttl };
        match conn
            .set_ex::<String, String, ()>(self.make_key(&key), value, effective_ttl)
            .await
        {
            Ok(_) => debug!("Cached {} for {}s", key, effective_ttl),
            Err(e) => error!("Failed to insert key '{}' into cache: {}", key, e),
        }
    }

    async fn remove(&self, key: &str) {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return;
            }
        };

        if let Err(e) = conn.del::<String, i32>(self.make_key(key)).await {
            error!("Failed to remove key '{}': {}", key, e);
        }
    }

    async fn invalidate_all(&self) {
        // 共享实例上不做 FLUSHDB，条目依赖 TTL 过期
        warn!("RedisObjectCache does not implement invalidate_all");
    }
}
