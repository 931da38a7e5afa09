use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{FusionWeights, PersonaAxis, PersonaType, ProductCondition};

/// Numeric policy for every pipeline stage
///
/// The algorithms in the stage services read all weights, thresholds and
/// lookup tables from here, so tuning never touches scoring code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringPolicy {
    #[serde(default)]
    pub classifier: ClassifierPolicy,
    #[serde(default)]
    pub matching: MatchingPolicy,
    #[serde(default)]
    pub fusion: FusionPolicy,
    #[serde(default)]
    pub sampling: SamplingPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPolicy {
    /// Confidence assigned when a rule rejects the nearest prototype
    pub fallback_confidence: f64,
    /// Used for rules that omit `min_confidence`
    pub default_min_confidence: f64,
    pub rule_blend_weight: f64,
    pub retrieval_blend_weight: f64,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            fallback_confidence: 0.5,
            default_min_confidence: 0.5,
            rule_blend_weight: 0.7,
            retrieval_blend_weight: 0.3,
        }
    }
}

/// Per-axis weights for buyer/seller persona affinity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisWeights {
    pub trust_safety: f64,
    pub quality_condition: f64,
    pub remote_transaction: f64,
    pub activity_responsiveness: f64,
    pub price_flexibility: f64,
}

impl AxisWeights {
    pub fn get(&self, axis: PersonaAxis) -> f64 {
        match axis {
            PersonaAxis::TrustSafety => self.trust_safety,
            PersonaAxis::QualityCondition => self.quality_condition,
            PersonaAxis::RemoteTransaction => self.remote_transaction,
            PersonaAxis::ActivityResponsiveness => self.activity_responsiveness,
            PersonaAxis::PriceFlexibility => self.price_flexibility,
        }
    }

    pub fn total(&self) -> f64 {
        PersonaAxis::ALL.iter().map(|&axis| self.get(axis)).sum()
    }
}

impl Default for AxisWeights {
    fn default() -> Self {
        Self {
            trust_safety: 0.24,
            quality_condition: 0.18,
            remote_transaction: 0.18,
            activity_responsiveness: 0.22,
            price_flexibility: 0.18,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionScores {
    pub new: f64,
    pub like_new: f64,
    pub used: f64,
    pub worn: f64,
    pub unknown: f64,
}

impl ConditionScores {
    pub fn score(&self, condition: ProductCondition) -> f64 {
        match condition {
            ProductCondition::New => self.new,
            ProductCondition::LikeNew => self.like_new,
            ProductCondition::Used => self.used,
            ProductCondition::Worn => self.worn,
            ProductCondition::Unknown => self.unknown,
        }
    }
}

impl Default for ConditionScores {
    fn default() -> Self {
        Self {
            new: 1.0,
            like_new: 0.8,
            used: 0.6,
            worn: 0.4,
            unknown: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingPolicy {
    pub axis_weights: AxisWeights,

    // seller final = persona_weight * persona + quality_weight * quality
    pub seller_persona_weight: f64,
    pub seller_quality_weight: f64,

    pub rating_weight: f64,
    pub sales_weight: f64,
    pub response_weight: f64,
    pub rating_scale: f64,
    pub sales_saturation: f64,
    pub response_window_hours: f64,

    pub view_weight: f64,
    pub like_weight: f64,
    pub condition_weight: f64,
    pub view_saturation: f64,
    pub like_saturation: f64,
    pub condition_scores: ConditionScores,

    // item = seller_weight * seller final + feature_weight * product feature
    pub item_seller_weight: f64,
    pub item_feature_weight: f64,
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            axis_weights: AxisWeights::default(),
            seller_persona_weight: 0.7,
            seller_quality_weight: 0.3,
            rating_weight: 0.5,
            sales_weight: 0.3,
            response_weight: 0.2,
            rating_scale: 5.0,
            sales_saturation: 1000.0,
            response_window_hours: 24.0,
            view_weight: 0.4,
            like_weight: 0.3,
            condition_weight: 0.3,
            view_saturation: 1000.0,
            like_saturation: 100.0,
            condition_scores: ConditionScores::default(),
            item_seller_weight: 0.6,
            item_feature_weight: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionPolicy {
    pub persona_weights: HashMap<PersonaType, FusionWeights>,
    /// Used for personas missing from `persona_weights`
    pub default_weights: FusionWeights,
    /// Weight multiplier at zero confidence; rises linearly to 1.0
    pub confidence_floor: f64,
    pub diversity_factor: f64,
    /// Neutral value for a channel whose scores are all equal
    pub constant_channel_value: f64,
}

impl FusionPolicy {
    pub fn weights_for(&self, persona: PersonaType) -> FusionWeights {
        self.persona_weights
            .get(&persona)
            .copied()
            .unwrap_or(self.default_weights)
    }

    /// `floor + (1 - floor) * confidence`, i.e. 0.5 + 0.5 * confidence by default
    pub fn confidence_factor(&self, confidence: f64) -> f64 {
        self.confidence_floor + (1.0 - self.confidence_floor) * confidence.clamp(0.0, 1.0)
    }
}

impl Default for FusionPolicy {
    fn default() -> Self {
        let persona_weights = HashMap::from([
            (PersonaType::TrustSafetyPro, FusionWeights::new(0.6, 0.3, 0.1)),
            (PersonaType::HighQualityNew, FusionWeights::new(0.4, 0.4, 0.2)),
            (PersonaType::FastShippingOnline, FusionWeights::new(0.5, 0.3, 0.2)),
            (PersonaType::LocalOffline, FusionWeights::new(0.6, 0.2, 0.2)),
            (PersonaType::NegotiationFriendly, FusionWeights::new(0.5, 0.2, 0.3)),
            (PersonaType::PowerSeller, FusionWeights::new(0.4, 0.4, 0.2)),
            (PersonaType::ResponsiveKind, FusionWeights::new(0.5, 0.3, 0.2)),
            (PersonaType::NicheSpecialist, FusionWeights::new(0.4, 0.3, 0.3)),
            (PersonaType::BalancedLowActivity, FusionWeights::new(0.4, 0.3, 0.3)),
            (PersonaType::HybridTrade, FusionWeights::new(0.4, 0.3, 0.3)),
        ]);

        Self {
            persona_weights,
            default_weights: FusionWeights::new(0.4, 0.3, 0.3),
            confidence_floor: 0.5,
            diversity_factor: 0.1,
            constant_channel_value: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    /// Score spread below which sampling is uniform
    pub uniform_spread: f64,
    /// Average score above which sampling concentrates on the top
    pub top_heavy_average: f64,
    pub high_score: f64,
    pub uniform_max_samples: usize,
    pub top_heavy_count: usize,
    pub weighted_top_count: usize,
    /// Row count above which a LIMIT hint is emitted
    pub limit_hint_rows: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            uniform_spread: 0.1,
            top_heavy_average: 0.7,
            high_score: 0.8,
            uniform_max_samples: 10,
            top_heavy_count: 5,
            weighted_top_count: 3,
            limit_hint_rows: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_axis_weights_sum_to_one() {
        assert!(approx(AxisWeights::default().total(), 1.0));
    }

    #[test]
    fn test_blend_weights_sum_to_one() {
        let policy = ScoringPolicy::default();
        let m = &policy.matching;
        assert!(approx(m.seller_persona_weight + m.seller_quality_weight, 1.0));
        assert!(approx(m.rating_weight + m.sales_weight + m.response_weight, 1.0));
        assert!(approx(m.view_weight + m.like_weight + m.condition_weight, 1.0));
        assert!(approx(m.item_seller_weight + m.item_feature_weight, 1.0));

        let c = &policy.classifier;
        assert!(approx(c.rule_blend_weight + c.retrieval_blend_weight, 1.0));
    }

    #[test]
    fn test_every_persona_has_fusion_weights_summing_to_one() {
        let fusion = FusionPolicy::default();
        for persona in PersonaType::ALL {
            assert!(fusion.persona_weights.contains_key(&persona), "{}", persona);
            assert!(approx(fusion.weights_for(persona).sum(), 1.0), "{}", persona);
        }
    }

    #[test]
    fn test_unmapped_persona_uses_default_weights() {
        let mut fusion = FusionPolicy::default();
        fusion.persona_weights.remove(&PersonaType::TrustSafetyPro);
        assert_eq!(
            fusion.weights_for(PersonaType::TrustSafetyPro),
            FusionWeights::new(0.4, 0.3, 0.3)
        );
    }

    #[test]
    fn test_confidence_factor_range() {
        let fusion = FusionPolicy::default();
        assert!(approx(fusion.confidence_factor(0.0), 0.5));
        assert!(approx(fusion.confidence_factor(1.0), 1.0));
        assert!(approx(fusion.confidence_factor(0.6), 0.8));
    }

    #[test]
    fn test_condition_scores_lookup() {
        let scores = ConditionScores::default();
        assert_eq!(scores.score(ProductCondition::New), 1.0);
        assert_eq!(scores.score(ProductCondition::LikeNew), 0.8);
        assert_eq!(scores.score(ProductCondition::Used), 0.6);
        assert_eq!(scores.score(ProductCondition::Worn), 0.4);
        assert_eq!(scores.score(ProductCondition::Unknown), 0.5);
    }

    #[test]
    fn test_policy_serializes_to_json() {
        let policy = ScoringPolicy::default();
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["matching"]["axis_weights"]["trust_safety"], 0.24);
        assert_eq!(
            json["fusion"]["persona_weights"]["trust_safety_pro"]["persona"],
            0.6
        );
    }
}
