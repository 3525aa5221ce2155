//! 对象缓存
//!
//! 后端以插件形式在进程启动时注册，按配置中的 `cache.type` 选择。
//! 目前只用来缓存令牌对应的 [`Principal`](crate::models::principals::entities::Principal)。

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache};

/// 声明一个缓存插件，进程加载时自动注册
///
/// 类型需要提供 `fn new() -> Result<Self, GradebookError>`。
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| -> $crate::cache::register::BoxedObjectCacheFuture {
                    Box::pin(async {
                        let cache: $crate::errors::Result<Box<dyn $crate::cache::ObjectCache>> =
                            <$ty>::new().map(|c| Box::new(c) as Box<dyn $crate::cache::ObjectCache>);
                        cache
                    })
                }),
            );
        }
    };
}
