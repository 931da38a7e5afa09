pub mod orchestrator;
pub mod persona_classifier;
pub mod pipeline;
pub mod policy;
pub mod product_matching;
pub mod query_builder;
pub mod ranker;
pub mod recommendations;
pub mod retriever;
pub mod rules;
pub mod sql_generator;

pub use persona_classifier::PersonaClassifier;
pub use pipeline::Pipeline;
pub use policy::ScoringPolicy;
