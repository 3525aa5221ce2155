use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{GradebookError, Result};
use crate::services::accounts::{AccountProvisioner, seed};
use crate::services::calendar::CalendarPolicy;
use crate::storage::Storage;
use crate::utils::id_generator::RandomIdGenerator;

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub calendar: Arc<CalendarPolicy>,
}

async fn build_cache(name: &str) -> Result<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name).ok_or_else(|| {
        GradebookError::cache_plugin_not_found(format!("cache backend '{name}' is not registered"))
    })?;
    let cache = constructor().await?;
    Ok(Arc::from(cache))
}

/// 按配置创建缓存，失败时退回进程内缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    match build_cache(cache_type).await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", cache_type);
            Ok(cache)
        }
        Err(e) if cache_type != "moka" => {
            warn!("Failed to create {} cache: {}, falling back to moka", cache_type, e);
            build_cache("moka").await
        }
        Err(e) => Err(e),
    }
}

/// 空库首次启动时导入种子数据
async fn seed_accounts(storage: &Arc<dyn Storage>) {
    let config = AppConfig::get();
    let seed_file = config.bootstrap.seed_file.trim();
    if seed_file.is_empty() {
        debug!("No seed file configured, skipping account import");
        return;
    }

    let accounts = AccountProvisioner::new(
        storage.clone(),
        Arc::new(RandomIdGenerator),
        config.argon2.clone(),
    );

    match seed::seed_if_empty(&accounts, seed_file).await {
        Ok(Some(issued)) => warn!(
            "Imported {} accounts from {}, store the credentials above",
            issued.len(),
            seed_file
        ),
        Ok(None) => {}
        Err(e) => error!("Failed to import seed file {}: {}", seed_file, e),
    }
}

/// 准备服务器启动的上下文：存储、教学日历、缓存
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
    }

    let config = AppConfig::get();

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    let calendar = CalendarPolicy::from_config(&config.calendar)
        .expect("Failed to load the instructional calendar");
    warn!(
        "Instructional calendar loaded with {} holidays",
        calendar.holidays().count()
    );

    seed_accounts(&storage).await;

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    StartupContext {
        storage,
        cache,
        calendar: Arc::new(calendar),
    }
}
