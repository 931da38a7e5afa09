use std::sync::Arc;

use crate::{
    cached,
    db::{
        redis::{Cache, CacheKey},
        MarketplaceStore,
    },
    error::AppResult,
    models::{Product, ProductFilters, Seller},
};

/// Redis read-through wrapper around another marketplace store
pub struct CachedMarketplaceStore {
    inner: Arc<dyn MarketplaceStore>,
    cache: Cache,
    ttl_secs: u64,
}

impl CachedMarketplaceStore {
    pub fn new(inner: Arc<dyn MarketplaceStore>, cache: Cache, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }
}

#[async_trait::async_trait]
impl MarketplaceStore for CachedMarketplaceStore {
    fn name(&self) -> &'static str {
        "redis_cached"
    }

    async fn fetch_sellers(&self, limit: usize) -> AppResult<Vec<Seller>> {
        cached!(
            self.cache,
            CacheKey::Sellers { limit },
            self.ttl_secs,
            self.inner.fetch_sellers(limit)
        )
    }

    async fn fetch_products(
        &self,
        seller_ids: &[String],
        filters: &ProductFilters,
    ) -> AppResult<Vec<Product>> {
        cached!(
            self.cache,
            CacheKey::products(seller_ids, filters),
            self.ttl_secs,
            self.inner.fetch_products(seller_ids, filters)
        )
    }
}
