use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::{StageError, StageErrorKind};

use super::{
    FinalItemScore, PersonaClassification, QueryPlan, ReasoningTrace, SearchQuery,
    SellerItemScore, UserInput,
};

/// Position of a request in the recommendation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Start,
    PersonaClassification,
    ProductMatching,
    Ranking,
    QueryGeneration,
    Completed,
    Error,
}

impl Step {
    /// Step that follows this one once it has completed
    ///
    /// `Completed` and `Error` are absorbing.
    pub fn next(self) -> Step {
        match self {
            Step::Start => Step::PersonaClassification,
            Step::PersonaClassification => Step::ProductMatching,
            Step::ProductMatching => Step::Ranking,
            Step::Ranking => Step::QueryGeneration,
            Step::QueryGeneration => Step::Completed,
            Step::Completed => Step::Completed,
            Step::Error => Step::Error,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Completed | Step::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::PersonaClassification => "persona_classification",
            Step::ProductMatching => "product_matching",
            Step::Ranking => "ranking",
            Step::QueryGeneration => "query_generation",
            Step::Completed => "completed",
            Step::Error => "error",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Step::Start => "Request received",
            Step::PersonaClassification => "Classify buyer persona",
            Step::ProductMatching => "Match buyer, sellers and products",
            Step::Ranking => "Fuse scores into the final ranking",
            Step::QueryGeneration => "Emit retrieval query",
            Step::Completed => "Workflow completed",
            Step::Error => "Workflow failed",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Step {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Step::Start),
            "persona_classification" => Ok(Step::PersonaClassification),
            "product_matching" => Ok(Step::ProductMatching),
            "ranking" => Ok(Step::Ranking),
            "query_generation" => Ok(Step::QueryGeneration),
            "completed" => Ok(Step::Completed),
            "error" => Ok(Step::Error),
            other => Err(StageError::UnknownStep(other.to_string())),
        }
    }
}

/// Request-scoped record threaded through every pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationState {
    pub session_id: String,
    pub user_input: UserInput,

    pub persona_classification: Option<PersonaClassification>,
    pub search_query: Option<SearchQuery>,
    pub seller_item_scores: Option<Vec<SellerItemScore>>,
    pub final_item_scores: Option<Vec<FinalItemScore>>,
    pub ranking_explanation: Option<ReasoningTrace>,
    pub sql_query: Option<QueryPlan>,

    pub current_step: Step,
    pub completed_steps: Vec<Step>,
    pub error_message: Option<String>,
    pub error_kind: Option<StageErrorKind>,

    pub created_at: DateTime<Utc>,
    /// Wall-clock seconds spent running the pipeline
    pub execution_time: Option<f64>,
}

impl RecommendationState {
    pub fn new(session_id: impl Into<String>, user_input: UserInput) -> Self {
        Self {
            session_id: session_id.into(),
            user_input,
            persona_classification: None,
            search_query: None,
            seller_item_scores: None,
            final_item_scores: None,
            ranking_explanation: None,
            sql_query: None,
            current_step: Step::Start,
            completed_steps: Vec::new(),
            error_message: None,
            error_kind: None,
            created_at: Utc::now(),
            execution_time: None,
        }
    }

    /// Records a successfully completed stage
    pub fn complete(&mut self, step: Step) {
        self.current_step = step;
        self.completed_steps.push(step);
    }

    /// Moves the state into the absorbing error step
    pub fn fail(&mut self, error: &StageError) {
        self.error_message = Some(error.to_string());
        self.error_kind = Some(error.kind());
        self.current_step = Step::Error;
    }

    pub fn is_terminal(&self) -> bool {
        self.error_message.is_some() || self.current_step.is_terminal()
    }
}
