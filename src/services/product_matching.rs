use std::collections::HashMap;

use crate::{
    error::StageError,
    models::{
        PersonaAxis, PersonaVector, Product, ProductCondition, Seller, SellerItemScore,
        SellerScore, MAX_AXIS_VALUE,
    },
    services::policy::MatchingPolicy,
};

/// Two-stage scorer: buyer/seller persona affinity, then product features
#[derive(Debug, Clone, Default)]
pub struct ProductMatcher {
    policy: MatchingPolicy,
}

impl ProductMatcher {
    pub fn new(policy: MatchingPolicy) -> Self {
        Self { policy }
    }

    /// Weighted per-axis affinity in [0, 1]
    pub fn persona_score(&self, user: &PersonaVector, seller: &PersonaVector) -> f64 {
        let weights = &self.policy.axis_weights;
        let total_weight = weights.total();
        if total_weight <= 0.0 {
            return 0.0;
        }

        let score: f64 = PersonaAxis::ALL
            .iter()
            .map(|&axis| {
                let diff = (user.get(axis) - seller.get(axis)).abs();
                weights.get(axis) * (1.0 - diff / MAX_AXIS_VALUE)
            })
            .sum();

        score / total_weight
    }

    /// Track-record score from rating, sales volume and response time
    pub fn quality_score(&self, seller: &Seller) -> f64 {
        let p = &self.policy;
        let rating = (seller.avg_rating / p.rating_scale).min(1.0);
        let sales = (seller.total_sales as f64 / p.sales_saturation).min(1.0);
        let response = (1.0 - seller.response_time_hours / p.response_window_hours).max(0.0);

        p.rating_weight * rating + p.sales_weight * sales + p.response_weight * response
    }

    pub fn product_feature_score(&self, product: &Product) -> f64 {
        let p = &self.policy;
        let views = (product.view_count as f64 / p.view_saturation).min(1.0);
        let likes = (product.like_count as f64 / p.like_saturation).min(1.0);
        let condition = p
            .condition_scores
            .score(ProductCondition::from_label(&product.condition));

        p.view_weight * views + p.like_weight * likes + p.condition_weight * condition
    }

    /// Scores every seller against the buyer vector, best first
    ///
    /// Sellers with equal final scores keep their input order.
    pub fn match_sellers(
        &self,
        user: &PersonaVector,
        sellers: &[Seller],
    ) -> Result<Vec<SellerScore>, StageError> {
        if sellers.is_empty() {
            return Err(StageError::EmptyInput("no sellers to match".to_string()));
        }

        let mut scores: Vec<SellerScore> = sellers
            .iter()
            .map(|seller| {
                let persona_score = self.persona_score(user, &seller.persona_vector);
                let quality_score = self.quality_score(seller);
                let final_score = self.policy.seller_persona_weight * persona_score
                    + self.policy.seller_quality_weight * quality_score;
                SellerScore {
                    seller: seller.clone(),
                    persona_score,
                    quality_score,
                    final_score,
                }
            })
            .collect();

        scores.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

        tracing::debug!(sellers = scores.len(), "Sellers scored");

        Ok(scores)
    }

    /// Scores products of the ranked sellers, best first
    ///
    /// Products whose seller is not in `ranked_sellers` are dropped. Ties keep
    /// seller rank order, then product input order.
    pub fn match_products(
        &self,
        ranked_sellers: &[SellerScore],
        products: &[Product],
    ) -> Result<Vec<SellerItemScore>, StageError> {
        if products.is_empty() {
            return Err(StageError::EmptyInput("no products to match".to_string()));
        }

        let mut by_seller: HashMap<&str, Vec<&Product>> = HashMap::new();
        for product in products {
            by_seller
                .entry(product.seller_id.as_str())
                .or_default()
                .push(product);
        }

        let mut items = Vec::new();
        for seller_score in ranked_sellers {
            let Some(seller_products) = by_seller.get(seller_score.seller.seller_id.as_str())
            else {
                continue;
            };

            for product in seller_products {
                let product_feature_score = self.product_feature_score(product);
                let item_score = self.policy.item_seller_weight * seller_score.final_score
                    + self.policy.item_feature_weight * product_feature_score;

                items.push(SellerItemScore {
                    product: (*product).clone(),
                    seller_name: seller_score.seller.seller_name.clone(),
                    seller_rating: seller_score.seller.avg_rating,
                    seller_persona_score: seller_score.persona_score,
                    seller_quality_score: seller_score.quality_score,
                    seller_final_score: seller_score.final_score,
                    product_feature_score,
                    item_score,
                });
            }
        }

        if items.is_empty() {
            return Err(StageError::EmptyInput(
                "no products from scored sellers".to_string(),
            ));
        }

        items.sort_by(|a, b| b.item_score.total_cmp(&a.item_score));

        let dropped = products.len() - items.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Products without a scored seller were dropped");
        }

        Ok(items)
    }

    /// Runs both stages over a sellers/products pair
    pub fn match_all(
        &self,
        user: &PersonaVector,
        sellers: &[Seller],
        products: &[Product],
    ) -> Result<Vec<SellerItemScore>, StageError> {
        if products.is_empty() {
            return Err(StageError::EmptyInput("no products to match".to_string()));
        }
        let ranked_sellers = self.match_sellers(user, sellers)?;
        let items = self.match_products(&ranked_sellers, products)?;

        tracing::info!(
            sellers = ranked_sellers.len(),
            items = items.len(),
            "Product matching complete"
        );

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::sample_sellers, models::PersonaType};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn seller(id: &str, vector: PersonaVector, rating: f64) -> Seller {
        Seller {
            seller_id: id.to_string(),
            seller_name: id.to_uppercase(),
            persona_vector: vector,
            total_sales: 100,
            avg_rating: rating,
            response_time_hours: 2.0,
        }
    }

    fn product(id: &str, seller_id: &str, condition: &str, views: u32, likes: u32) -> Product {
        Product {
            product_id: id.to_string(),
            seller_id: seller_id.to_string(),
            title: format!("Item {}", id),
            price: 10000.0,
            category: "electronics".to_string(),
            condition: condition.to_string(),
            location: "Seoul".to_string(),
            description: String::new(),
            view_count: views,
            like_count: likes,
        }
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let matcher = ProductMatcher::default();
        let v = PersonaVector::new(80.0, 20.0, 60.0, 40.0, 10.0);
        assert!(approx(matcher.persona_score(&v, &v), 1.0));
    }

    #[test]
    fn test_opposite_vectors_score_zero() {
        let matcher = ProductMatcher::default();
        let low = PersonaVector::new(0.0, 0.0, 0.0, 0.0, 0.0);
        let high = PersonaVector::new(100.0, 100.0, 100.0, 100.0, 100.0);
        assert!(approx(matcher.persona_score(&low, &high), 0.0));
    }

    #[test]
    fn test_quality_score_saturates() {
        let matcher = ProductMatcher::default();
        let mut s = seller("s", PersonaVector::neutral(), 5.0);
        s.total_sales = 5000;
        s.response_time_hours = 0.0;
        assert!(approx(matcher.quality_score(&s), 1.0));

        s.avg_rating = 0.0;
        s.total_sales = 0;
        s.response_time_hours = 48.0;
        assert!(approx(matcher.quality_score(&s), 0.0));
    }

    #[test]
    fn test_product_feature_score_by_condition() {
        let matcher = ProductMatcher::default();
        let fresh = product("p1", "s", "새상품", 1000, 100);
        assert!(approx(matcher.product_feature_score(&fresh), 1.0));

        let unknown = product("p2", "s", "refurbished", 0, 0);
        assert!(approx(matcher.product_feature_score(&unknown), 0.3 * 0.5));

        let worn = product("p3", "s", "worn", 500, 50);
        assert!(approx(
            matcher.product_feature_score(&worn),
            0.4 * 0.5 + 0.3 * 0.5 + 0.3 * 0.4
        ));
    }

    #[test]
    fn test_empty_sellers_is_an_error() {
        let matcher = ProductMatcher::default();
        let err = matcher
            .match_sellers(&PersonaVector::neutral(), &[])
            .unwrap_err();
        assert!(matches!(err, StageError::EmptyInput(_)));
    }

    #[test]
    fn test_empty_products_is_an_error() {
        let matcher = ProductMatcher::default();
        let sellers = vec![seller("s1", PersonaVector::neutral(), 4.0)];
        let err = matcher
            .match_all(&PersonaVector::neutral(), &sellers, &[])
            .unwrap_err();
        assert!(matches!(err, StageError::EmptyInput(_)));
    }

    #[test]
    fn test_only_unknown_sellers_is_an_error() {
        let matcher = ProductMatcher::default();
        let sellers = vec![seller("s1", PersonaVector::neutral(), 4.0)];
        let products = vec![product("p1", "ghost", "new", 10, 1)];
        let err = matcher
            .match_all(&PersonaVector::neutral(), &sellers, &products)
            .unwrap_err();
        assert_eq!(
            err,
            StageError::EmptyInput("no products from scored sellers".to_string())
        );
    }

    #[test]
    fn test_sellers_sorted_with_stable_ties() {
        let matcher = ProductMatcher::default();
        let user = PersonaVector::neutral();
        let sellers = vec![
            seller("a", PersonaVector::neutral(), 4.0),
            seller("b", PersonaType::LocalOffline.prototype(), 4.0),
            seller("c", PersonaVector::neutral(), 4.0),
        ];
        let ranked = matcher.match_sellers(&user, &sellers).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|s| s.seller.seller_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_neutral_user_ranks_sample_sellers_deterministically() {
        let matcher = ProductMatcher::default();
        let sellers = sample_sellers();
        let first = matcher
            .match_sellers(&PersonaVector::neutral(), &sellers)
            .unwrap();
        let second = matcher
            .match_sellers(&PersonaVector::neutral(), &sellers)
            .unwrap();
        assert_eq!(first, second);

        let ids: Vec<&str> = first.iter().map(|s| s.seller.seller_id.as_str()).collect();
        assert_eq!(ids, vec!["seller_3", "seller_2", "seller_1"]);
        for pair in first.windows(2) {
            assert!(pair[0].final_score >= pair[1].final_score);
        }
    }

    #[test]
    fn test_products_of_unknown_sellers_are_dropped() {
        let matcher = ProductMatcher::default();
        let sellers = vec![seller("s1", PersonaVector::neutral(), 4.5)];
        let products = vec![
            product("p1", "s1", "new", 10, 1),
            product("p2", "ghost", "new", 999, 99),
        ];
        let items = matcher
            .match_all(&PersonaVector::neutral(), &sellers, &products)
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product.product_id, "p1");
        assert_eq!(items[0].seller_name, "S1");
        assert!(approx(
            items[0].item_score,
            0.6 * items[0].seller_final_score + 0.4 * items[0].product_feature_score
        ));
    }

    #[test]
    fn test_items_sorted_descending() {
        let matcher = ProductMatcher::default();
        let sellers = vec![
            seller("s1", PersonaVector::neutral(), 4.5),
            seller("s2", PersonaType::NegotiationFriendly.prototype(), 3.0),
        ];
        let products = vec![
            product("p1", "s2", "used", 100, 10),
            product("p2", "s1", "new", 800, 80),
            product("p3", "s1", "worn", 0, 0),
            product("p4", "s2", "like-new", 300, 5),
        ];
        let items = matcher
            .match_all(&PersonaVector::neutral(), &sellers, &products)
            .unwrap();

        assert_eq!(items.len(), 4);
        for pair in items.windows(2) {
            assert!(pair[0].item_score >= pair[1].item_score);
        }
    }
}
