pub mod postgres;
pub mod redis;
pub mod sample;
pub mod store;

pub use postgres::{create_pool, run_migrations, PgMarketplaceStore};
pub use redis::create_redis_client;
pub use redis::{Cache, CacheKey, CacheWriterHandle, CachedMarketplaceStore};
pub use sample::{sample_products, sample_sellers, InMemoryMarketplaceStore};
pub use store::{FallbackMarketplaceStore, MarketplaceStore, DEFAULT_SELLER_FETCH_LIMIT};

#[cfg(test)]
pub use store::MockMarketplaceStore;
