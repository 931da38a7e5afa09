use serde_json::json;
use std::{collections::HashSet, fmt::Write};

use crate::{
    models::{
        FinalItemScore, FusionWeights, PersonaClassification, RankingFactors, ReasoningTrace,
        SellerItemScore,
    },
    services::policy::FusionPolicy,
};

/// Number of items described in the rendered explanation
const EXPLAINED_ITEMS: usize = 3;

/// Result of one fusion pass
#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutcome {
    pub items: Vec<FinalItemScore>,
    pub trace: ReasoningTrace,
}

/// Fuses persona, quality and feature channels into the final ranking
#[derive(Debug, Clone, Default)]
pub struct FusionRanker {
    policy: FusionPolicy,
}

impl FusionRanker {
    pub fn new(policy: FusionPolicy) -> Self {
        Self { policy }
    }

    /// Min-max normalizes a channel; a constant channel maps to the policy's neutral value
    pub fn normalize_channel(&self, values: &[f64]) -> Vec<f64> {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        if values.is_empty() || range <= 0.0 {
            return vec![self.policy.constant_channel_value; values.len()];
        }

        values.iter().map(|v| (v - min) / range).collect()
    }

    /// Persona weight triple scaled by classification confidence
    pub fn persona_weights(&self, classification: &PersonaClassification) -> FusionWeights {
        self.policy
            .weights_for(classification.persona_type)
            .scaled(self.policy.confidence_factor(classification.confidence))
    }

    pub fn fuse(
        &self,
        items: &[SellerItemScore],
        classification: &PersonaClassification,
    ) -> FusionOutcome {
        let mut trace = ReasoningTrace::new();
        trace.add_step(
            "Input analysis",
            json!({
                "total_items": items.len(),
                "persona_type": classification.persona_type.as_str(),
                "confidence": classification.confidence,
            }),
        );

        if items.is_empty() {
            trace.explanation = format!(
                "No items to rank for a {} buyer.",
                classification.persona_type.display_name()
            );
            return FusionOutcome {
                items: Vec::new(),
                trace,
            };
        }

        let n = items.len();
        let persona = self.normalize_channel(
            &items.iter().map(|i| i.seller_persona_score).collect::<Vec<_>>(),
        );
        let quality = self.normalize_channel(
            &items.iter().map(|i| i.seller_quality_score).collect::<Vec<_>>(),
        );
        let feature = self.normalize_channel(
            &items.iter().map(|i| i.product_feature_score).collect::<Vec<_>>(),
        );
        trace.add_step(
            "Score normalization",
            json!({
                "method": "min-max",
                "channels": ["persona", "quality", "feature"],
            }),
        );

        let weights = self.persona_weights(classification);
        let weighted: Vec<f64> = (0..n)
            .map(|i| {
                weights.persona * persona[i]
                    + weights.quality * quality[i]
                    + weights.feature * feature[i]
            })
            .collect();
        trace.add_step(
            "Persona weighting",
            json!({
                "persona_type": classification.persona_type.as_str(),
                "confidence_factor": self.policy.confidence_factor(classification.confidence),
                "persona": weights.persona,
                "quality": weights.quality,
                "feature": weights.feature,
            }),
        );

        // Pre-bonus order: weighted score descending, ties by input position
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| weighted[b].total_cmp(&weighted[a]));

        let categories: HashSet<&str> = items.iter().map(|i| i.product.category.as_str()).collect();
        let sellers: HashSet<&str> = items.iter().map(|i| i.product.seller_id.as_str()).collect();
        let category_diversity = categories.len() as f64 / n as f64;
        let seller_diversity = sellers.len() as f64 / n as f64;
        let base_bonus = if n < 2 {
            0.0
        } else {
            self.policy.diversity_factor * (category_diversity + seller_diversity) / 2.0
        };
        trace.add_step(
            "Diversity bonus",
            json!({
                "unique_categories": categories.len(),
                "unique_sellers": sellers.len(),
                "category_diversity": category_diversity,
                "seller_diversity": seller_diversity,
                "base_bonus": base_bonus,
            }),
        );

        let mut fused: Vec<FinalItemScore> = order
            .iter()
            .enumerate()
            .map(|(rank, &i)| {
                // Lower pre-bonus rank earns a larger share
                let diversity_bonus = base_bonus * (rank + 1) as f64 / n as f64;
                FinalItemScore {
                    item: items[i].clone(),
                    final_score: weighted[i] + diversity_bonus,
                    ranking_factors: RankingFactors {
                        persona_match: persona[i],
                        seller_quality: quality[i],
                        product_features: feature[i],
                        weighted_score: weighted[i],
                        diversity_bonus,
                        persona_weights: weights,
                    },
                }
            })
            .collect();

        fused.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

        trace.add_step(
            "Final ranking",
            json!({
                "top_item": fused.first().map(|f| f.item.product.title.clone()),
                "top_score": fused.first().map(|f| f.final_score).unwrap_or_default(),
            }),
        );
        trace.explanation = self.explain(&fused, classification);

        tracing::info!(
            items = fused.len(),
            persona = %classification.persona_type,
            base_bonus = base_bonus,
            "Fusion ranking complete"
        );

        FusionOutcome {
            items: fused,
            trace,
        }
    }

    /// Short natural-language summary of the persona and the top items
    pub fn explain(&self, items: &[FinalItemScore], classification: &PersonaClassification) -> String {
        let mut out = format!(
            "Ranked {} items for a {} buyer ({}, confidence {:.2}).",
            items.len(),
            classification.persona_type.display_name(),
            classification.persona_type,
            classification.confidence
        );

        for (i, item) in items.iter().take(EXPLAINED_ITEMS).enumerate() {
            let f = &item.ranking_factors;
            let _ = write!(
                out,
                "\n{}. {} from {} (score {:.3}; persona {:.2}, quality {:.2}, features {:.2})",
                i + 1,
                item.item.product.title,
                item.item.seller_name,
                item.final_score,
                f.persona_match,
                f.seller_quality,
                f.product_features
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassificationPath, PersonaType, Product};

    fn classification(persona: PersonaType, confidence: f64) -> PersonaClassification {
        PersonaClassification {
            persona_type: persona,
            confidence,
            vector: persona.prototype(),
            matched_prototype: persona.prototype(),
            reason: "test".to_string(),
            path: ClassificationPath::PrototypeMatch,
            retrieval_blended: false,
            candidates: Vec::new(),
        }
    }

    fn item(id: &str, seller: &str, category: &str, scores: (f64, f64, f64)) -> SellerItemScore {
        SellerItemScore {
            product: Product {
                product_id: id.to_string(),
                seller_id: seller.to_string(),
                title: format!("Title {}", id),
                price: 1000.0,
                category: category.to_string(),
                condition: "used".to_string(),
                location: "Seoul".to_string(),
                description: String::new(),
                view_count: 0,
                like_count: 0,
            },
            seller_name: seller.to_string(),
            seller_rating: 4.0,
            seller_persona_score: scores.0,
            seller_quality_score: scores.1,
            seller_final_score: 0.0,
            product_feature_score: scores.2,
            item_score: 0.0,
        }
    }

    fn sample_items() -> Vec<SellerItemScore> {
        vec![
            item("p1", "s1", "electronics", (0.9, 0.7, 0.4)),
            item("p2", "s2", "fashion", (0.6, 0.9, 0.8)),
            item("p3", "s1", "electronics", (0.3, 0.7, 0.6)),
            item("p4", "s3", "books", (0.75, 0.5, 0.2)),
        ]
    }

    #[test]
    fn test_normalize_channel_min_max() {
        let ranker = FusionRanker::default();
        assert_eq!(ranker.normalize_channel(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_constant_channel_is_neutral() {
        let ranker = FusionRanker::default();
        assert_eq!(ranker.normalize_channel(&[0.7, 0.7, 0.7]), vec![0.5, 0.5, 0.5]);
        assert!(ranker.normalize_channel(&[]).is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        let ranker = FusionRanker::default();
        let outcome = ranker.fuse(&[], &classification(PersonaType::HybridTrade, 0.8));
        assert!(outcome.items.is_empty());

        let input = outcome.trace.step("Input analysis").unwrap();
        assert_eq!(input.details["total_items"], 0);
    }

    #[test]
    fn test_output_sorted_descending() {
        let ranker = FusionRanker::default();
        let outcome = ranker.fuse(&sample_items(), &classification(PersonaType::TrustSafetyPro, 0.9));

        assert_eq!(outcome.items.len(), 4);
        for pair in outcome.items.windows(2) {
            assert!(pair[0].final_score >= pair[1].final_score);
        }
        for f in &outcome.items {
            let r = &f.ranking_factors;
            assert!((f.final_score - (r.weighted_score + r.diversity_bonus)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lower_ranked_items_get_larger_bonus() {
        let ranker = FusionRanker::default();
        let outcome = ranker.fuse(&sample_items(), &classification(PersonaType::HybridTrade, 0.6));

        let mut by_weighted: Vec<&FinalItemScore> = outcome.items.iter().collect();
        by_weighted.sort_by(|a, b| {
            b.ranking_factors
                .weighted_score
                .total_cmp(&a.ranking_factors.weighted_score)
        });
        for pair in by_weighted.windows(2) {
            assert!(pair[0].ranking_factors.diversity_bonus <= pair[1].ranking_factors.diversity_bonus);
        }
        assert!(by_weighted.iter().all(|f| f.ranking_factors.diversity_bonus > 0.0));
    }

    #[test]
    fn test_diversity_base_bonus() {
        let ranker = FusionRanker::default();
        let outcome = ranker.fuse(&sample_items(), &classification(PersonaType::HybridTrade, 1.0));

        // 3 categories and 3 sellers over 4 items
        let expected_base = 0.1 * (0.75 + 0.75) / 2.0;
        let step = outcome.trace.step("Diversity bonus").unwrap();
        assert!((step.details["base_bonus"].as_f64().unwrap() - expected_base).abs() < 1e-12);

        let max_bonus = outcome
            .items
            .iter()
            .map(|f| f.ranking_factors.diversity_bonus)
            .fold(0.0, f64::max);
        assert!((max_bonus - expected_base).abs() < 1e-12);
    }

    #[test]
    fn test_single_item_gets_no_bonus() {
        let ranker = FusionRanker::default();
        let items = vec![item("p1", "s1", "books", (0.5, 0.5, 0.5))];
        let outcome = ranker.fuse(&items, &classification(PersonaType::PowerSeller, 1.0));

        assert_eq!(outcome.items.len(), 1);
        let f = &outcome.items[0];
        assert_eq!(f.ranking_factors.diversity_bonus, 0.0);
        // Every channel is constant, so each normalizes to 0.5
        assert!((f.final_score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_weights_scale_with_confidence() {
        let ranker = FusionRanker::default();
        let full = ranker.persona_weights(&classification(PersonaType::TrustSafetyPro, 1.0));
        assert_eq!(full, FusionWeights::new(0.6, 0.3, 0.1));

        let none = ranker.persona_weights(&classification(PersonaType::TrustSafetyPro, 0.0));
        assert!((none.persona - 0.3).abs() < 1e-12);
        assert!((none.sum() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fusion_is_repeatable() {
        let ranker = FusionRanker::default();
        let c = classification(PersonaType::NegotiationFriendly, 0.72);
        let first = ranker.fuse(&sample_items(), &c);
        let second = ranker.fuse(&sample_items(), &c);
        assert_eq!(first, second);
    }

    #[test]
    fn test_trace_records_every_step() {
        let ranker = FusionRanker::default();
        let outcome = ranker.fuse(&sample_items(), &classification(PersonaType::LocalOffline, 0.8));

        let labels: Vec<&str> = outcome.trace.steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Input analysis",
                "Score normalization",
                "Persona weighting",
                "Diversity bonus",
                "Final ranking"
            ]
        );
        assert!(outcome.trace.explanation.contains("Local offline trader"));
        assert!(outcome.trace.explanation.contains("1. "));
        assert!(outcome.trace.render().starts_with("1. Input analysis"));
    }
}
