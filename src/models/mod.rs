mod marketplace;
mod persona;
mod query_plan;
mod reasoning;
mod recommendation;
mod state;

pub use marketplace::{MarketplaceSnapshot, Product, ProductCondition, ProductFilters, Seller};
pub use persona::{PersonaAxis, PersonaType, PersonaVector, MAX_AXIS_VALUE, NEUTRAL_AXIS_VALUE};
pub use query_plan::{
    ExecutionHints, QueryPlan, Sample, SamplingPlan, SamplingReason, SamplingStrategy, ScoreRange,
};
pub use reasoning::{ReasoningStep, ReasoningTrace};
pub use recommendation::{
    ClassificationPath, FinalItemScore, FusionWeights, PersonaCandidate, PersonaClassification,
    RankingFactors, SearchQuery, SellerItemScore, SellerScore, SliderInput, SliderValue,
    UserInput,
};
pub use state::{RecommendationState, Step};
