use crate::{
    db::MarketplaceStore,
    error::AppResult,
    models::{PersonaVector, Product, ProductFilters, Seller},
};

/// Three demo sellers covering trust-focused, fast-shipping and bargaining styles
pub fn sample_sellers() -> Vec<Seller> {
    vec![
        Seller {
            seller_id: "seller_1".to_string(),
            seller_name: "Trusted Safe Dealer".to_string(),
            persona_vector: PersonaVector::new(95.0, 80.0, 70.0, 85.0, 30.0),
            total_sales: 150,
            avg_rating: 4.8,
            response_time_hours: 2.0,
        },
        Seller {
            seller_id: "seller_2".to_string(),
            seller_name: "Express Shipper".to_string(),
            persona_vector: PersonaVector::new(75.0, 70.0, 90.0, 95.0, 40.0),
            total_sales: 200,
            avg_rating: 4.6,
            response_time_hours: 1.0,
        },
        Seller {
            seller_id: "seller_3".to_string(),
            seller_name: "Bargain Maker".to_string(),
            persona_vector: PersonaVector::new(60.0, 60.0, 50.0, 70.0, 90.0),
            total_sales: 80,
            avg_rating: 4.2,
            response_time_hours: 4.0,
        },
    ]
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            product_id: "prod_1".to_string(),
            seller_id: "seller_1".to_string(),
            title: "iPhone 14 Pro Max 256GB sealed".to_string(),
            price: 1_200_000.0,
            category: "smartphone".to_string(),
            condition: "new".to_string(),
            location: "Seoul Gangnam-gu".to_string(),
            description: "Unopened. Safe payment available.".to_string(),
            view_count: 150,
            like_count: 25,
        },
        Product {
            product_id: "prod_2".to_string(),
            seller_id: "seller_2".to_string(),
            title: "MacBook Pro 16 M2".to_string(),
            price: 2_500_000.0,
            category: "laptop".to_string(),
            condition: "used".to_string(),
            location: "Seoul Seocho-gu".to_string(),
            description: "Ships fast. Good condition.".to_string(),
            view_count: 200,
            like_count: 40,
        },
        Product {
            product_id: "prod_3".to_string(),
            seller_id: "seller_3".to_string(),
            title: "Nike Air Max 270 sneakers".to_string(),
            price: 150_000.0,
            category: "shoes".to_string(),
            condition: "like-new".to_string(),
            location: "Busan Haeundae-gu".to_string(),
            description: "Price negotiable. Prefers meeting in person.".to_string(),
            view_count: 80,
            like_count: 15,
        },
    ]
}

/// Store backed by in-process vectors
///
/// Used as the development catalog and as the fallback when the database
/// is unreachable. Filtering follows the same rules as the SQL store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketplaceStore {
    sellers: Vec<Seller>,
    products: Vec<Product>,
}

impl InMemoryMarketplaceStore {
    pub fn new(sellers: Vec<Seller>, products: Vec<Product>) -> Self {
        Self { sellers, products }
    }

    pub fn with_sample_data() -> Self {
        Self::new(sample_sellers(), sample_products())
    }
}

#[async_trait::async_trait]
impl MarketplaceStore for InMemoryMarketplaceStore {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn fetch_sellers(&self, limit: usize) -> AppResult<Vec<Seller>> {
        Ok(self.sellers.iter().take(limit).cloned().collect())
    }

    async fn fetch_products(
        &self,
        seller_ids: &[String],
        filters: &ProductFilters,
    ) -> AppResult<Vec<Product>> {
        if seller_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .products
            .iter()
            .filter(|p| seller_ids.contains(&p.seller_id) && filters.matches(p))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_ids() -> Vec<String> {
        sample_sellers().into_iter().map(|s| s.seller_id).collect()
    }

    #[tokio::test]
    async fn test_fetch_sellers_respects_limit() {
        let store = InMemoryMarketplaceStore::with_sample_data();
        assert_eq!(store.fetch_sellers(2).await.unwrap().len(), 2);
        assert_eq!(store.fetch_sellers(50).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_products_by_seller() {
        let store = InMemoryMarketplaceStore::with_sample_data();
        let products = store
            .fetch_products(&["seller_2".to_string()], &ProductFilters::default())
            .await
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_id, "prod_2");

        let none = store
            .fetch_products(&[], &ProductFilters::default())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_products_applies_filters() {
        let store = InMemoryMarketplaceStore::with_sample_data();
        let filters = ProductFilters {
            price_max: Some(1_500_000.0),
            location: Some("Seoul".to_string()),
            ..Default::default()
        };
        let products = store.fetch_products(&all_ids(), &filters).await.unwrap();

        let ids: Vec<&str> = products.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["prod_1"]);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = InMemoryMarketplaceStore::default();
        assert!(store.fetch_sellers(10).await.unwrap().is_empty());
        assert!(store
            .fetch_products(&all_ids(), &ProductFilters::default())
            .await
            .unwrap()
            .is_empty());
    }
}
