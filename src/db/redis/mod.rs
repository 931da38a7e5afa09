pub mod cache;
pub mod cached_store;

mod macros;

pub use cache::create_redis_client;
pub use cache::Cache;
pub use cache::CacheKey;
pub use cache::CacheWriterHandle;
pub use cached_store::CachedMarketplaceStore;
