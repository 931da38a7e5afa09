use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a downstream consumer should subsample the ranked results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    Uniform,
    TopHeavy,
    Weighted,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingReason {
    UniformDistribution,
    TopPerformers,
    HighScore,
    TopRank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 1-based rank in the final ordering
    pub rank: usize,
    pub product_id: String,
    pub title: String,
    pub score: f64,
    pub sampling_reason: SamplingReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPlan {
    pub strategy: SamplingStrategy,
    pub total_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_range: Option<ScoreRange>,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionHints {
    pub hints: Vec<String>,
    pub optimization: String,
    pub estimated_rows: usize,
    pub category_diversity: usize,
    pub seller_diversity: usize,
}

/// Parameterized retrieval query for materializing ranked results
///
/// Purely descriptive: nothing in this crate executes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub query: String,
    pub parameters: BTreeMap<String, String>,
    pub sample_plan: SamplingPlan,
    pub total_items: usize,
    pub execution_hints: ExecutionHints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<usize>,
}
