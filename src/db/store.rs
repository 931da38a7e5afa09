use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Product, ProductFilters, Seller},
};

/// Sellers loaded per request unless configured otherwise
pub const DEFAULT_SELLER_FETCH_LIMIT: usize = 50;

/// Read-only source of sellers and their listings
///
/// Implementations must tolerate empty results: no sellers or no matching
/// products is an empty `Vec`, not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MarketplaceStore: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Sellers that carry persona data, at most `limit`
    async fn fetch_sellers(&self, limit: usize) -> AppResult<Vec<Seller>>;

    /// Listings of the given sellers narrowed by `filters`, newest first
    async fn fetch_products(
        &self,
        seller_ids: &[String],
        filters: &ProductFilters,
    ) -> AppResult<Vec<Product>>;
}

/// Serves from `primary`, switching to `fallback` for any call that fails
pub struct FallbackMarketplaceStore {
    primary: Arc<dyn MarketplaceStore>,
    fallback: Arc<dyn MarketplaceStore>,
}

impl FallbackMarketplaceStore {
    pub fn new(primary: Arc<dyn MarketplaceStore>, fallback: Arc<dyn MarketplaceStore>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait::async_trait]
impl MarketplaceStore for FallbackMarketplaceStore {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn fetch_sellers(&self, limit: usize) -> AppResult<Vec<Seller>> {
        match self.primary.fetch_sellers(limit).await {
            Ok(sellers) => Ok(sellers),
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Seller fetch failed, using fallback store"
                );
                self.fallback.fetch_sellers(limit).await
            }
        }
    }

    async fn fetch_products(
        &self,
        seller_ids: &[String],
        filters: &ProductFilters,
    ) -> AppResult<Vec<Product>> {
        match self.primary.fetch_products(seller_ids, filters).await {
            Ok(products) => Ok(products),
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Product fetch failed, using fallback store"
                );
                self.fallback.fetch_products(seller_ids, filters).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::InMemoryMarketplaceStore, error::AppError};

    #[tokio::test]
    async fn test_fallback_serves_when_primary_fails() {
        let mut primary = MockMarketplaceStore::new();
        primary.expect_name().return_const("mock");
        primary
            .expect_fetch_sellers()
            .times(1)
            .returning(|_| Err(AppError::Internal("connection refused".to_string())));
        primary
            .expect_fetch_products()
            .times(1)
            .returning(|_, _| Err(AppError::Internal("connection refused".to_string())));

        let store = FallbackMarketplaceStore::new(
            Arc::new(primary),
            Arc::new(InMemoryMarketplaceStore::with_sample_data()),
        );

        let sellers = store.fetch_sellers(50).await.unwrap();
        assert_eq!(sellers.len(), 3);

        let ids: Vec<String> = sellers.iter().map(|s| s.seller_id.clone()).collect();
        let products = store
            .fetch_products(&ids, &ProductFilters::default())
            .await
            .unwrap();
        assert_eq!(products.len(), 3);
    }

    #[tokio::test]
    async fn test_fallback_untouched_when_primary_succeeds() {
        let mut primary = MockMarketplaceStore::new();
        primary
            .expect_fetch_sellers()
            .with(mockall::predicate::eq(10))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let mut fallback = MockMarketplaceStore::new();
        fallback.expect_fetch_sellers().never();

        let store = FallbackMarketplaceStore::new(Arc::new(primary), Arc::new(fallback));
        let sellers = store.fetch_sellers(10).await.unwrap();
        assert!(sellers.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_error_is_returned() {
        let mut primary = MockMarketplaceStore::new();
        primary.expect_name().return_const("primary");
        primary
            .expect_fetch_sellers()
            .returning(|_| Err(AppError::Internal("down".to_string())));

        let mut fallback = MockMarketplaceStore::new();
        fallback.expect_name().return_const("secondary");
        fallback
            .expect_fetch_sellers()
            .returning(|_| Err(AppError::Internal("also down".to_string())));

        let store = FallbackMarketplaceStore::new(Arc::new(primary), Arc::new(fallback));
        let err = store.fetch_sellers(5).await.unwrap_err();
        assert!(err.to_string().contains("also down"));
    }
}
