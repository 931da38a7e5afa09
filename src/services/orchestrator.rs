use crate::models::{RecommendationState, Step};

/// Routing decision after a stage has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    End,
}

/// Step that follows the named step
///
/// Names outside the workflow route to `Step::Error`. `completed` and
/// `error` are absorbing.
pub fn transition(current: &str) -> Step {
    match current.parse::<Step>() {
        Ok(step) => step.next(),
        Err(e) => {
            tracing::warn!(error = %e, "Unrecognized workflow step");
            Step::Error
        }
    }
}

pub fn should_continue(state: &RecommendationState) -> Flow {
    if state.error_message.is_some() || state.current_step.is_terminal() {
        Flow::End
    } else {
        Flow::Continue
    }
}

/// Whether the artifact produced by `step` is present on the state
pub fn step_output_present(state: &RecommendationState, step: Step) -> bool {
    match step {
        Step::Start => true,
        Step::PersonaClassification => state.persona_classification.is_some(),
        Step::ProductMatching => {
            state.search_query.is_some() && state.seller_item_scores.is_some()
        }
        Step::Ranking => {
            state.final_item_scores.is_some() && state.ranking_explanation.is_some()
        }
        Step::QueryGeneration => state.sql_query.is_some(),
        Step::Completed => state.sql_query.is_some(),
        Step::Error => false,
    }
}
