use std::{
    collections::{BTreeMap, HashSet},
    fmt::Write,
};

use crate::{
    models::{
        ExecutionHints, FinalItemScore, QueryPlan, Sample, SamplingPlan, SamplingReason,
        SamplingStrategy, ScoreRange,
    },
    services::policy::SamplingPolicy,
};

const EMPTY_QUERY: &str = "SELECT 'No recommendations available' AS message";

const SELECT_COLUMNS: &str = "SELECT
    p.product_id,
    p.seller_id,
    p.title,
    p.price,
    p.category,
    p.condition,
    p.location,
    p.description,
    p.created_at,
    p.view_count,
    p.like_count,
    s.seller_name,
    s.avg_rating AS seller_rating,
    s.total_sales,
    s.response_time_hours,";

/// Emits parameterized retrieval queries and sampling plans for ranked items
#[derive(Debug, Clone, Default)]
pub struct SqlGenerator {
    policy: SamplingPolicy,
}

impl SqlGenerator {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self { policy }
    }

    /// Builds a query plan for the top `limit` items
    pub fn generate_query(&self, items: &[FinalItemScore], limit: usize) -> QueryPlan {
        if items.is_empty() || limit == 0 {
            return Self::empty_plan();
        }

        let top = &items[..limit.min(items.len())];
        let (query, parameters) = Self::build_sql(top);

        QueryPlan {
            query,
            parameters,
            sample_plan: self.sampling_plan(top),
            total_items: top.len(),
            execution_hints: self.execution_hints(top),
            batch_number: None,
        }
    }

    /// Splits the items into consecutive batches, numbered from 1
    pub fn generate_batch_queries(
        &self,
        items: &[FinalItemScore],
        batch_size: usize,
    ) -> Vec<QueryPlan> {
        if items.is_empty() {
            return vec![Self::empty_plan()];
        }

        items
            .chunks(batch_size.max(1))
            .enumerate()
            .map(|(i, batch)| {
                let mut plan = self.generate_query(batch, batch.len());
                plan.batch_number = Some(i + 1);
                plan
            })
            .collect()
    }

    fn build_sql(items: &[FinalItemScore]) -> (String, BTreeMap<String, String>) {
        let mut parameters = BTreeMap::new();
        let mut cases = String::new();
        let mut placeholders = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            let name = format!("product_id_{}", i);
            let _ = write!(
                cases,
                "\n        WHEN :{} THEN {:.6}",
                name, item.final_score
            );
            placeholders.push(format!(":{}", name));
            parameters.insert(name, item.item.product.product_id.clone());
        }

        let query = format!(
            "{}
    CASE p.product_id{}
    END AS recommendation_score
FROM products p
JOIN sellers s ON p.seller_id = s.seller_id
WHERE p.product_id IN ({})
ORDER BY recommendation_score DESC",
            SELECT_COLUMNS,
            cases,
            placeholders.join(", ")
        );

        (query, parameters)
    }

    pub fn sampling_plan(&self, items: &[FinalItemScore]) -> SamplingPlan {
        if items.is_empty() {
            return SamplingPlan {
                strategy: SamplingStrategy::Empty,
                total_items: 0,
                score_range: None,
                samples: Vec::new(),
            };
        }

        let scores: Vec<f64> = items.iter().map(|i| i.final_score).collect();
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = scores.iter().sum::<f64>() / scores.len() as f64;

        let strategy = if max - min < self.policy.uniform_spread {
            SamplingStrategy::Uniform
        } else if avg > self.policy.top_heavy_average {
            SamplingStrategy::TopHeavy
        } else {
            SamplingStrategy::Weighted
        };

        SamplingPlan {
            strategy,
            total_items: items.len(),
            score_range: Some(ScoreRange { min, max, avg }),
            samples: self.samples(items, strategy),
        }
    }

    fn samples(&self, items: &[FinalItemScore], strategy: SamplingStrategy) -> Vec<Sample> {
        let sample = |rank: usize, item: &FinalItemScore, reason| Sample {
            rank: rank + 1,
            product_id: item.item.product.product_id.clone(),
            title: item.item.product.title.clone(),
            score: item.final_score,
            sampling_reason: reason,
        };

        match strategy {
            SamplingStrategy::Uniform => {
                let step = (items.len() / self.policy.uniform_max_samples.max(1)).max(1);
                items
                    .iter()
                    .enumerate()
                    .step_by(step)
                    .map(|(i, item)| sample(i, item, SamplingReason::UniformDistribution))
                    .collect()
            }
            SamplingStrategy::TopHeavy => items
                .iter()
                .take(self.policy.top_heavy_count)
                .enumerate()
                .map(|(i, item)| sample(i, item, SamplingReason::TopPerformers))
                .collect(),
            SamplingStrategy::Weighted => items
                .iter()
                .enumerate()
                .filter(|(i, item)| {
                    *i < self.policy.weighted_top_count || item.final_score > self.policy.high_score
                })
                .map(|(i, item)| {
                    let reason = if item.final_score > self.policy.high_score {
                        SamplingReason::HighScore
                    } else {
                        SamplingReason::TopRank
                    };
                    sample(i, item, reason)
                })
                .collect(),
            SamplingStrategy::Empty => Vec::new(),
        }
    }

    pub fn execution_hints(&self, items: &[FinalItemScore]) -> ExecutionHints {
        let categories: HashSet<&str> = items
            .iter()
            .map(|i| i.item.product.category.as_str())
            .collect();
        let sellers: HashSet<&str> = items
            .iter()
            .map(|i| i.item.product.seller_id.as_str())
            .collect();

        let mut hints = Vec::new();
        if categories.len() > 1 {
            hints.push("Consider index on products.category".to_string());
        }
        if sellers.len() > 1 {
            hints.push("Consider index on products.seller_id".to_string());
        }
        if items.len() > self.policy.limit_hint_rows {
            hints.push("Consider LIMIT clause for better performance".to_string());
        }

        ExecutionHints {
            hints,
            optimization: if items.is_empty() { "none" } else { "standard" }.to_string(),
            estimated_rows: items.len(),
            category_diversity: categories.len(),
            seller_diversity: sellers.len(),
        }
    }

    fn empty_plan() -> QueryPlan {
        QueryPlan {
            query: EMPTY_QUERY.to_string(),
            parameters: BTreeMap::new(),
            sample_plan: SamplingPlan {
                strategy: SamplingStrategy::Empty,
                total_items: 0,
                score_range: None,
                samples: Vec::new(),
            },
            total_items: 0,
            execution_hints: ExecutionHints {
                hints: Vec::new(),
                optimization: "none".to_string(),
                estimated_rows: 0,
                category_diversity: 0,
                seller_diversity: 0,
            },
            batch_number: None,
        }
    }
}
