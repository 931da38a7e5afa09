use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Neutral value used for any axis that was not provided
pub const NEUTRAL_AXIS_VALUE: f64 = 50.0;

/// Upper bound of every persona axis
pub const MAX_AXIS_VALUE: f64 = 100.0;

/// One of the five behavioral axes of the persona space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaAxis {
    TrustSafety,
    QualityCondition,
    RemoteTransaction,
    ActivityResponsiveness,
    PriceFlexibility,
}

impl PersonaAxis {
    pub const ALL: [PersonaAxis; 5] = [
        PersonaAxis::TrustSafety,
        PersonaAxis::QualityCondition,
        PersonaAxis::RemoteTransaction,
        PersonaAxis::ActivityResponsiveness,
        PersonaAxis::PriceFlexibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaAxis::TrustSafety => "trust_safety",
            PersonaAxis::QualityCondition => "quality_condition",
            PersonaAxis::RemoteTransaction => "remote_transaction",
            PersonaAxis::ActivityResponsiveness => "activity_responsiveness",
            PersonaAxis::PriceFlexibility => "price_flexibility",
        }
    }
}

impl Display for PersonaAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PersonaAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PersonaAxis::ALL
            .into_iter()
            .find(|axis| axis.as_str() == s)
            .ok_or_else(|| format!("unknown persona axis: {}", s))
    }
}

/// Five-axis persona vector, every axis within [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonaVector {
    #[serde(default = "neutral")]
    pub trust_safety: f64,
    #[serde(default = "neutral")]
    pub quality_condition: f64,
    #[serde(default = "neutral")]
    pub remote_transaction: f64,
    #[serde(default = "neutral")]
    pub activity_responsiveness: f64,
    #[serde(default = "neutral")]
    pub price_flexibility: f64,
}

fn neutral() -> f64 {
    NEUTRAL_AXIS_VALUE
}

impl Default for PersonaVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl PersonaVector {
    pub const fn new(
        trust_safety: f64,
        quality_condition: f64,
        remote_transaction: f64,
        activity_responsiveness: f64,
        price_flexibility: f64,
    ) -> Self {
        Self {
            trust_safety,
            quality_condition,
            remote_transaction,
            activity_responsiveness,
            price_flexibility,
        }
    }

    /// Vector with every axis at the neutral midpoint
    pub const fn neutral() -> Self {
        Self::new(
            NEUTRAL_AXIS_VALUE,
            NEUTRAL_AXIS_VALUE,
            NEUTRAL_AXIS_VALUE,
            NEUTRAL_AXIS_VALUE,
            NEUTRAL_AXIS_VALUE,
        )
    }

    /// Builds a vector from raw axis values, clamping each into [0, 100]
    pub fn clamped(values: impl Fn(PersonaAxis) -> f64) -> Self {
        let clamp = |axis| values(axis).clamp(0.0, MAX_AXIS_VALUE);
        Self::new(
            clamp(PersonaAxis::TrustSafety),
            clamp(PersonaAxis::QualityCondition),
            clamp(PersonaAxis::RemoteTransaction),
            clamp(PersonaAxis::ActivityResponsiveness),
            clamp(PersonaAxis::PriceFlexibility),
        )
    }

    pub fn get(&self, axis: PersonaAxis) -> f64 {
        match axis {
            PersonaAxis::TrustSafety => self.trust_safety,
            PersonaAxis::QualityCondition => self.quality_condition,
            PersonaAxis::RemoteTransaction => self.remote_transaction,
            PersonaAxis::ActivityResponsiveness => self.activity_responsiveness,
            PersonaAxis::PriceFlexibility => self.price_flexibility,
        }
    }

    /// Euclidean distance between two vectors
    pub fn l2_distance(&self, other: &PersonaVector) -> f64 {
        PersonaAxis::ALL
            .iter()
            .map(|&axis| (self.get(axis) - other.get(axis)).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Cosine similarity, 0.0 when either vector has zero magnitude
    pub fn cosine_similarity(&self, other: &PersonaVector) -> f64 {
        let dot: f64 = PersonaAxis::ALL
            .iter()
            .map(|&axis| self.get(axis) * other.get(axis))
            .sum();
        let norm = |v: &PersonaVector| {
            PersonaAxis::ALL
                .iter()
                .map(|&axis| v.get(axis).powi(2))
                .sum::<f64>()
                .sqrt()
        };
        let denominator = norm(self) * norm(other);
        if denominator == 0.0 {
            0.0
        } else {
            dot / denominator
        }
    }

    /// Largest possible distance inside the persona space: sqrt(5 * 100^2)
    pub fn max_distance() -> f64 {
        (PersonaAxis::ALL.len() as f64 * MAX_AXIS_VALUE.powi(2)).sqrt()
    }
}

/// The ten behavioral archetypes, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaType {
    LocalOffline,
    FastShippingOnline,
    HybridTrade,
    TrustSafetyPro,
    HighQualityNew,
    NicheSpecialist,
    PowerSeller,
    NegotiationFriendly,
    ResponsiveKind,
    BalancedLowActivity,
}

impl PersonaType {
    /// Declaration order; prototype ties resolve to the earliest entry
    pub const ALL: [PersonaType; 10] = [
        PersonaType::LocalOffline,
        PersonaType::FastShippingOnline,
        PersonaType::HybridTrade,
        PersonaType::TrustSafetyPro,
        PersonaType::HighQualityNew,
        PersonaType::NicheSpecialist,
        PersonaType::PowerSeller,
        PersonaType::NegotiationFriendly,
        PersonaType::ResponsiveKind,
        PersonaType::BalancedLowActivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaType::LocalOffline => "local_offline",
            PersonaType::FastShippingOnline => "fast_shipping_online",
            PersonaType::HybridTrade => "hybrid_trade",
            PersonaType::TrustSafetyPro => "trust_safety_pro",
            PersonaType::HighQualityNew => "high_quality_new",
            PersonaType::NicheSpecialist => "niche_specialist",
            PersonaType::PowerSeller => "power_seller",
            PersonaType::NegotiationFriendly => "negotiation_friendly",
            PersonaType::ResponsiveKind => "responsive_kind",
            PersonaType::BalancedLowActivity => "balanced_low_activity",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PersonaType::LocalOffline => "Local offline trader",
            PersonaType::FastShippingOnline => "Fast-shipping online trader",
            PersonaType::HybridTrade => "Hybrid trader",
            PersonaType::TrustSafetyPro => "Trust & safety expert",
            PersonaType::HighQualityNew => "Mint-condition seeker",
            PersonaType::NicheSpecialist => "Niche specialist",
            PersonaType::PowerSeller => "Active power seller",
            PersonaType::NegotiationFriendly => "Negotiation friendly",
            PersonaType::ResponsiveKind => "Responsive and kind",
            PersonaType::BalancedLowActivity => "Balanced, low activity, cautious",
        }
    }

    /// Canonical prototype vector for this persona
    pub fn prototype(&self) -> PersonaVector {
        match self {
            PersonaType::LocalOffline => PersonaVector::new(25.0, 0.0, 0.0, 25.0, 50.0),
            PersonaType::FastShippingOnline => PersonaVector::new(75.0, 25.0, 75.0, 50.0, 25.0),
            PersonaType::HybridTrade => PersonaVector::new(50.0, 50.0, 50.0, 50.0, 50.0),
            PersonaType::TrustSafetyPro => PersonaVector::new(100.0, 50.0, 50.0, 75.0, 25.0),
            PersonaType::HighQualityNew => PersonaVector::new(50.0, 100.0, 25.0, 50.0, 25.0),
            PersonaType::NicheSpecialist => PersonaVector::new(50.0, 75.0, 50.0, 50.0, 25.0),
            PersonaType::PowerSeller => PersonaVector::new(50.0, 50.0, 50.0, 100.0, 25.0),
            PersonaType::NegotiationFriendly => PersonaVector::new(25.0, 25.0, 25.0, 25.0, 100.0),
            PersonaType::ResponsiveKind => PersonaVector::new(75.0, 50.0, 50.0, 100.0, 25.0),
            PersonaType::BalancedLowActivity => PersonaVector::new(50.0, 50.0, 50.0, 25.0, 50.0),
        }
    }

    /// Terms appended to the buyer's search phrase for this persona
    pub fn search_enhancement(&self) -> &'static str {
        match self {
            PersonaType::TrustSafetyPro => "safe-payment trusted",
            PersonaType::HighQualityNew => "new sealed mint",
            PersonaType::FastShippingOnline => "fast-shipping parcel",
            PersonaType::LocalOffline => "in-person local",
            PersonaType::NegotiationFriendly => "negotiable offer",
            PersonaType::ResponsiveKind => "friendly quick-reply",
            PersonaType::PowerSeller => "active seller",
            PersonaType::NicheSpecialist => "specialist expert",
            PersonaType::BalancedLowActivity => "careful seller",
            PersonaType::HybridTrade => "online offline",
        }
    }
}

impl Display for PersonaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PersonaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PersonaType::ALL
            .into_iter()
            .find(|persona| persona.as_str() == s)
            .ok_or_else(|| format!("unknown persona: {}", s))
    }
}
