use std::time::Instant;

use crate::{
    error::StageError,
    models::{
        MarketplaceSnapshot, PersonaClassification, QueryPlan, RecommendationState, SearchQuery,
        SellerItemScore, Step,
    },
    services::{
        orchestrator::{self, Flow},
        persona_classifier::PersonaClassifier,
        policy::ScoringPolicy,
        product_matching::ProductMatcher,
        query_builder,
        ranker::{FusionOutcome, FusionRanker},
        sql_generator::SqlGenerator,
    },
};

pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 20;

/// The four recommendation stages wired over one request state
///
/// Stages are synchronous and perform no I/O; the caller supplies the
/// marketplace snapshot.
#[derive(Clone)]
pub struct Pipeline {
    classifier: PersonaClassifier,
    matcher: ProductMatcher,
    ranker: FusionRanker,
    sql: SqlGenerator,
    max_recommendations: usize,
}

impl Pipeline {
    pub fn new(classifier: PersonaClassifier, policy: &ScoringPolicy) -> Self {
        Self {
            classifier,
            matcher: ProductMatcher::new(policy.matching.clone()),
            ranker: FusionRanker::new(policy.fusion.clone()),
            sql: SqlGenerator::new(policy.sampling.clone()),
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
        }
    }

    pub fn with_max_recommendations(mut self, max_recommendations: usize) -> Self {
        self.max_recommendations = max_recommendations;
        self
    }

    pub fn max_recommendations(&self) -> usize {
        self.max_recommendations
    }

    pub fn classifier(&self) -> &PersonaClassifier {
        &self.classifier
    }

    pub fn classify_stage(
        &self,
        state: &RecommendationState,
    ) -> Result<PersonaClassification, StageError> {
        self.classifier.classify(&state.user_input.preferences)
    }

    pub fn matching_stage(
        &self,
        state: &RecommendationState,
        snapshot: &MarketplaceSnapshot,
    ) -> Result<(SearchQuery, Vec<SellerItemScore>), StageError> {
        let classification = state.persona_classification.as_ref().ok_or_else(|| {
            StageError::MissingPrerequisite("persona classification".to_string())
        })?;

        let search_query =
            query_builder::build_search_query(&state.user_input, classification.persona_type);

        // Stores filter at fetch time; re-apply so every source behaves the same
        let products: Vec<_> = snapshot
            .products
            .iter()
            .filter(|p| search_query.filters.matches(p))
            .cloned()
            .collect();

        let items = self
            .matcher
            .match_all(&classification.vector, &snapshot.sellers, &products)?;

        Ok((search_query, items))
    }

    pub fn ranking_stage(&self, state: &RecommendationState) -> Result<FusionOutcome, StageError> {
        let classification = state.persona_classification.as_ref().ok_or_else(|| {
            StageError::MissingPrerequisite("persona classification".to_string())
        })?;
        let items = state
            .seller_item_scores
            .as_ref()
            .ok_or_else(|| StageError::MissingPrerequisite("seller item scores".to_string()))?;

        Ok(self.ranker.fuse(items, classification))
    }

    pub fn query_stage(&self, state: &RecommendationState) -> Result<QueryPlan, StageError> {
        let items = state
            .final_item_scores
            .as_ref()
            .ok_or_else(|| StageError::MissingPrerequisite("final item scores".to_string()))?;

        Ok(self.sql.generate_query(items, self.max_recommendations))
    }

    /// Runs exactly one stage and records its outcome on the state
    pub fn advance(
        &self,
        state: &mut RecommendationState,
        snapshot: &MarketplaceSnapshot,
    ) -> Flow {
        if orchestrator::should_continue(state) == Flow::End {
            return Flow::End;
        }

        let step = state.current_step.next();
        tracing::debug!(
            session_id = %state.session_id,
            step = %step,
            "{}",
            step.description()
        );

        let outcome = match step {
            Step::PersonaClassification => self.classify_stage(state).map(|classification| {
                state.persona_classification = Some(classification);
            }),
            Step::ProductMatching => {
                self.matching_stage(state, snapshot)
                    .map(|(search_query, items)| {
                        state.search_query = Some(search_query);
                        state.seller_item_scores = Some(items);
                    })
            }
            Step::Ranking => self.ranking_stage(state).map(|outcome| {
                state.final_item_scores = Some(outcome.items);
                state.ranking_explanation = Some(outcome.trace);
            }),
            Step::QueryGeneration => self.query_stage(state).map(|plan| {
                state.sql_query = Some(plan);
            }),
            Step::Completed => {
                state.current_step = Step::Completed;
                return Flow::End;
            }
            Step::Start | Step::Error => Err(StageError::UnknownStep(step.to_string())),
        };

        match outcome {
            Ok(()) => {
                state.complete(step);
                tracing::info!(session_id = %state.session_id, step = %step, "Stage completed");
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    step = %step,
                    error = %e,
                    "Stage failed"
                );
                state.fail(&e);
            }
        }

        orchestrator::should_continue(state)
    }

    /// Advances until the workflow ends and records the elapsed time
    pub fn run(
        &self,
        mut state: RecommendationState,
        snapshot: &MarketplaceSnapshot,
    ) -> RecommendationState {
        let started = Instant::now();

        while self.advance(&mut state, snapshot) == Flow::Continue {}

        let elapsed = started.elapsed().as_secs_f64();
        state.execution_time = Some(elapsed);

        tracing::info!(
            session_id = %state.session_id,
            step = %state.current_step,
            completed = state.completed_steps.len(),
            elapsed_secs = elapsed,
            "Recommendation workflow finished"
        );

        state
    }
}
