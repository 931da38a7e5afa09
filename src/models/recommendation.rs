use serde::{Deserialize, Serialize};

use super::{PersonaAxis, PersonaType, PersonaVector, Product, ProductFilters, Seller};

// ============================================================================
// User input
// ============================================================================

/// Raw slider value, accepted either as a number or as a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SliderValue {
    Number(f64),
    Text(String),
}

impl SliderValue {
    /// Parses the value into a finite number
    pub fn to_f64(&self) -> Result<f64, String> {
        let value = match self {
            SliderValue::Number(n) => *n,
            SliderValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", s))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("{} is not a finite number", value))
        }
    }
}

impl From<f64> for SliderValue {
    fn from(value: f64) -> Self {
        SliderValue::Number(value)
    }
}

/// Slider positions for each persona axis, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliderInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_safety: Option<SliderValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_condition: Option<SliderValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_transaction: Option<SliderValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_responsiveness: Option<SliderValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_flexibility: Option<SliderValue>,
}

impl SliderInput {
    pub fn get(&self, axis: PersonaAxis) -> Option<&SliderValue> {
        match axis {
            PersonaAxis::TrustSafety => self.trust_safety.as_ref(),
            PersonaAxis::QualityCondition => self.quality_condition.as_ref(),
            PersonaAxis::RemoteTransaction => self.remote_transaction.as_ref(),
            PersonaAxis::ActivityResponsiveness => self.activity_responsiveness.as_ref(),
            PersonaAxis::PriceFlexibility => self.price_flexibility.as_ref(),
        }
    }

    /// Slider input that places every axis exactly at the given vector
    pub fn from_vector(vector: &PersonaVector) -> Self {
        Self {
            trust_safety: Some(vector.trust_safety.into()),
            quality_condition: Some(vector.quality_condition.into()),
            remote_transaction: Some(vector.remote_transaction.into()),
            activity_responsiveness: Some(vector.activity_responsiveness.into()),
            price_flexibility: Some(vector.price_flexibility.into()),
        }
    }
}

/// Everything a buyer submits for one recommendation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub preferences: SliderInput,
}

impl UserInput {
    /// Product filters carried by this input
    pub fn filters(&self) -> ProductFilters {
        ProductFilters {
            price_min: self.price_min,
            price_max: self.price_max,
            category: self.category.clone().filter(|c| !c.trim().is_empty()),
            location: self.location.clone().filter(|l| !l.trim().is_empty()),
        }
    }
}

// ============================================================================
// Persona classification
// ============================================================================

/// A persona suggested by the retrieval source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaCandidate {
    pub persona_name: String,
    /// Similarity in [0, 1]
    pub similarity: f64,
    pub content: String,
}

/// Which decision path produced the persona label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPath {
    /// Nearest prototype, no rule registered for it
    PrototypeMatch,
    /// Nearest prototype confirmed by its rule
    RuleConfirmed,
    /// Rule rejected the nearest prototype; fallback persona used
    RuleFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaClassification {
    pub persona_type: PersonaType,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// The buyer's normalized vector
    pub vector: PersonaVector,
    pub matched_prototype: PersonaVector,
    /// Human-readable account of the path taken
    pub reason: String,
    pub path: ClassificationPath,
    pub retrieval_blended: bool,
    #[serde(default)]
    pub candidates: Vec<PersonaCandidate>,
}

// ============================================================================
// Search query
// ============================================================================

/// Persona-aware search criteria derived from the user input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub original_query: String,
    pub enhanced_query: String,
    pub keywords: Vec<String>,
    pub filters: ProductFilters,
}

// ============================================================================
// Scoring artifacts
// ============================================================================

/// A seller scored against the buyer's persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerScore {
    pub seller: Seller,
    pub persona_score: f64,
    pub quality_score: f64,
    pub final_score: f64,
}

/// A product annotated with its seller's scores and its own feature score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerItemScore {
    #[serde(flatten)]
    pub product: Product,
    pub seller_name: String,
    pub seller_rating: f64,
    pub seller_persona_score: f64,
    pub seller_quality_score: f64,
    pub seller_final_score: f64,
    pub product_feature_score: f64,
    pub item_score: f64,
}

/// Weight triple applied to the persona, quality and feature channels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub persona: f64,
    pub quality: f64,
    pub feature: f64,
}

impl FusionWeights {
    pub const fn new(persona: f64, quality: f64, feature: f64) -> Self {
        Self {
            persona,
            quality,
            feature,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.persona * factor,
            self.quality * factor,
            self.feature * factor,
        )
    }

    pub fn sum(&self) -> f64 {
        self.persona + self.quality + self.feature
    }
}

/// Component breakdown explaining a final score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingFactors {
    pub persona_match: f64,
    pub seller_quality: f64,
    pub product_features: f64,
    pub weighted_score: f64,
    pub diversity_bonus: f64,
    pub persona_weights: FusionWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalItemScore {
    #[serde(flatten)]
    pub item: SellerItemScore,
    pub final_score: f64,
    pub ranking_factors: RankingFactors,
}
