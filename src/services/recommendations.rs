use serde::Serialize;

use crate::{
    db::MarketplaceStore,
    error::{AppError, AppResult},
    models::{
        FinalItemScore, MarketplaceSnapshot, PersonaClassification, PersonaType, PersonaVector,
        RecommendationState, SearchQuery, Step, UserInput,
    },
    services::pipeline::Pipeline,
};

/// One recommended listing as returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedProduct {
    pub product_id: String,
    pub seller_id: String,
    pub title: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub location: String,
    pub match_score: f64,
    pub persona_score: f64,
}

impl From<&FinalItemScore> for RecommendedProduct {
    fn from(scored: &FinalItemScore) -> Self {
        let product = &scored.item.product;
        Self {
            product_id: product.product_id.clone(),
            seller_id: product.seller_id.clone(),
            title: product.title.clone(),
            price: product.price,
            category: product.category.clone(),
            condition: product.condition.clone(),
            location: product.location.clone(),
            match_score: scored.final_score,
            persona_score: scored.item.seller_persona_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub persona_type: PersonaType,
    pub confidence: f64,
    pub vector: PersonaVector,
}

impl From<&PersonaClassification> for ClassificationSummary {
    fn from(classification: &PersonaClassification) -> Self {
        Self {
            persona_type: classification.persona_type,
            confidence: classification.confidence,
            vector: classification.vector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResponse {
    pub products: Vec<RecommendedProduct>,
    pub total_count: usize,
    pub persona_classification: Option<ClassificationSummary>,
    pub search_query: Option<SearchQuery>,
    pub explanation: Option<String>,
    pub execution_time: Option<f64>,
    pub session_id: String,
}

impl RecommendationResponse {
    /// Builds the client response from a finished workflow
    ///
    /// A state that ended in the error step yields `AppError::Pipeline` and
    /// no partial result.
    pub fn from_state(state: RecommendationState, limit: usize) -> AppResult<Self> {
        if state.current_step == Step::Error {
            let message = state
                .error_message
                .unwrap_or_else(|| "Recommendation workflow failed".to_string());
            return Err(AppError::Pipeline(message));
        }

        let products: Vec<RecommendedProduct> = state
            .final_item_scores
            .as_deref()
            .unwrap_or_default()
            .iter()
            .take(limit)
            .map(RecommendedProduct::from)
            .collect();

        Ok(Self {
            total_count: products.len(),
            products,
            persona_classification: state
                .persona_classification
                .as_ref()
                .map(ClassificationSummary::from),
            search_query: state.search_query,
            explanation: state
                .ranking_explanation
                .map(|trace| trace.explanation)
                .filter(|text| !text.is_empty()),
            execution_time: state.execution_time,
            session_id: state.session_id,
        })
    }
}

/// Loads the sellers and their listings the pipeline will score
pub async fn fetch_snapshot(
    store: &dyn MarketplaceStore,
    input: &UserInput,
    seller_fetch_limit: usize,
) -> AppResult<MarketplaceSnapshot> {
    let sellers = store.fetch_sellers(seller_fetch_limit).await?;
    let seller_ids: Vec<String> = sellers.iter().map(|s| s.seller_id.clone()).collect();
    let products = store.fetch_products(&seller_ids, &input.filters()).await?;

    tracing::info!(
        store = store.name(),
        sellers = sellers.len(),
        products = products.len(),
        "Loaded marketplace snapshot"
    );

    Ok(MarketplaceSnapshot { sellers, products })
}

/// Generates persona-aware recommendations for one request
///
/// Fetches a snapshot from `store`, runs every pipeline stage over it and
/// returns at most the pipeline's configured number of products.
pub async fn get_recommendations(
    pipeline: &Pipeline,
    store: &dyn MarketplaceStore,
    seller_fetch_limit: usize,
    session_id: String,
    input: UserInput,
) -> AppResult<RecommendationResponse> {
    let snapshot = fetch_snapshot(store, &input, seller_fetch_limit).await?;

    let state = pipeline.run(RecommendationState::new(session_id, input), &snapshot);

    RecommendationResponse::from_state(state, pipeline.max_recommendations())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{InMemoryMarketplaceStore, MockMarketplaceStore},
        models::SliderInput,
        services::{
            persona_classifier::PersonaClassifier,
            policy::{ClassifierPolicy, ScoringPolicy},
        },
    };

    fn pipeline() -> Pipeline {
        Pipeline::new(
            PersonaClassifier::new(ClassifierPolicy::default()),
            &ScoringPolicy::default(),
        )
    }

    fn input(query: &str) -> UserInput {
        UserInput {
            search_query: query.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_recommendations_from_sample_store() {
        let store = InMemoryMarketplaceStore::with_sample_data();
        let response = get_recommendations(&pipeline(), &store, 50, "req-1".to_string(), input("phone"))
            .await
            .unwrap();

        assert_eq!(response.session_id, "req-1");
        assert_eq!(response.total_count, 3);
        assert_eq!(response.products.len(), 3);
        for pair in response.products.windows(2) {
            assert!(pair[0].match_score >= pair[1].match_score);
        }
        assert_eq!(
            response.persona_classification.unwrap().persona_type,
            PersonaType::HybridTrade
        );
        assert!(response.explanation.unwrap().starts_with("Ranked 3 items"));
        assert!(response.execution_time.is_some());
    }

    #[tokio::test]
    async fn test_response_truncated_to_max_recommendations() {
        let store = InMemoryMarketplaceStore::with_sample_data();
        let pipeline = pipeline().with_max_recommendations(1);
        let response = get_recommendations(&pipeline, &store, 50, "req-2".to_string(), input(""))
            .await
            .unwrap();

        assert_eq!(response.total_count, 1);
    }

    #[tokio::test]
    async fn test_filters_are_forwarded_to_store() {
        let mut store = MockMarketplaceStore::new();
        store.expect_name().return_const("mock");
        store
            .expect_fetch_sellers()
            .with(mockall::predicate::eq(7))
            .returning(|_| Ok(crate::db::sample_sellers()));
        store
            .expect_fetch_products()
            .withf(|ids, filters| ids.len() == 3 && filters.category.as_deref() == Some("shoes"))
            .returning(|_, _| Ok(Vec::new()));

        let mut user_input = input("sneakers");
        user_input.category = Some("shoes".to_string());

        let snapshot = fetch_snapshot(&store, &user_input, 7).await.unwrap();
        assert_eq!(snapshot.sellers.len(), 3);
        assert!(snapshot.products.is_empty());
    }

    #[tokio::test]
    async fn test_empty_store_is_pipeline_error() {
        let store = InMemoryMarketplaceStore::default();
        let err = get_recommendations(&pipeline(), &store, 50, "req-3".to_string(), input("phone"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Pipeline(_)));
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut store = MockMarketplaceStore::new();
        store
            .expect_fetch_sellers()
            .returning(|_| Err(AppError::Internal("db down".to_string())));

        let err = get_recommendations(&pipeline(), &store, 50, "req-4".to_string(), input("phone"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_trust_safety_pro_summary() {
        let mut user_input = input("camera");
        user_input.preferences =
            SliderInput::from_vector(&PersonaType::TrustSafetyPro.prototype());
        let state = pipeline().run(
            RecommendationState::new("req-5", user_input),
            &MarketplaceSnapshot {
                sellers: crate::db::sample_sellers(),
                products: crate::db::sample_products(),
            },
        );

        let response = RecommendationResponse::from_state(state, 20).unwrap();
        let summary = response.persona_classification.unwrap();
        assert_eq!(summary.persona_type, PersonaType::TrustSafetyPro);
        assert_eq!(summary.vector, PersonaType::TrustSafetyPro.prototype());
    }
}
