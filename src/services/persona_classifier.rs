use std::{path::Path, sync::Arc};

use crate::{
    error::{ConfigError, StageError},
    models::{
        ClassificationPath, PersonaAxis, PersonaClassification, PersonaType, PersonaVector,
        SliderInput, NEUTRAL_AXIS_VALUE,
    },
    services::{
        policy::ClassifierPolicy,
        retriever::{PersonaCandidateSource, PlaybookRetriever},
        rules::RulesConfig,
    },
};

/// Classifies a buyer into one of the ten personas
///
/// Nearest-prototype matching is always available. Rule validation and
/// retrieval blending are optional layers that refine the result when
/// their configuration was loaded.
#[derive(Clone)]
pub struct PersonaClassifier {
    policy: ClassifierPolicy,
    rules: Option<RulesConfig>,
    retriever: Option<Arc<dyn PersonaCandidateSource>>,
}

impl PersonaClassifier {
    pub fn new(policy: ClassifierPolicy) -> Self {
        Self {
            policy,
            rules: None,
            retriever: None,
        }
    }

    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn PersonaCandidateSource>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Builds a classifier from on-disk configuration
    ///
    /// A missing or broken rules file or playbook is logged and the matching
    /// layer is skipped; this never fails.
    pub fn from_paths(
        policy: ClassifierPolicy,
        rules_path: impl AsRef<Path>,
        playbook_dir: impl AsRef<Path>,
    ) -> Self {
        let mut classifier = Self::new(policy);

        match RulesConfig::load(rules_path.as_ref()) {
            Ok(rules) => classifier = classifier.with_rules(rules),
            Err(ConfigError::Missing(path)) => {
                tracing::warn!(path = %path, "Rules file not found, using prototype matching only")
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load rules, using prototype matching only")
            }
        }

        match PlaybookRetriever::load(playbook_dir.as_ref()) {
            Ok(retriever) if !retriever.is_empty() => {
                classifier = classifier.with_retriever(Arc::new(retriever))
            }
            Ok(_) => tracing::warn!("Playbook is empty, retrieval blending disabled"),
            Err(e) => tracing::warn!(error = %e, "Playbook unavailable, retrieval blending disabled"),
        }

        classifier
    }

    pub fn has_rules(&self) -> bool {
        self.rules.is_some()
    }

    pub fn has_retriever(&self) -> bool {
        self.retriever.is_some()
    }

    /// Turns raw slider positions into a clamped persona vector
    ///
    /// Absent sliders sit at the neutral midpoint.
    pub fn normalize(prefs: &SliderInput) -> Result<PersonaVector, StageError> {
        let mut raw = [NEUTRAL_AXIS_VALUE; 5];
        for (slot, axis) in raw.iter_mut().zip(PersonaAxis::ALL) {
            if let Some(value) = prefs.get(axis) {
                *slot = value
                    .to_f64()
                    .map_err(|e| StageError::InvalidInput(format!("{}: {}", axis, e)))?;
            }
        }

        Ok(PersonaVector::clamped(|axis| {
            PersonaAxis::ALL
                .iter()
                .position(|a| *a == axis)
                .map_or(NEUTRAL_AXIS_VALUE, |index| raw[index])
        }))
    }

    /// Closest prototype by L2 distance; ties go to the earliest persona
    pub fn nearest_prototype(vector: &PersonaVector) -> (PersonaType, f64) {
        let mut best = PersonaType::ALL[0];
        let mut best_distance = vector.l2_distance(&best.prototype());

        for persona in PersonaType::ALL.iter().skip(1) {
            let distance = vector.l2_distance(&persona.prototype());
            if distance < best_distance {
                best = *persona;
                best_distance = distance;
            }
        }

        (best, best_distance)
    }

    /// Maps a distance to a confidence in [0, 1]; zero distance is full confidence
    pub fn distance_confidence(distance: f64) -> f64 {
        (1.0 - distance / PersonaVector::max_distance()).clamp(0.0, 1.0)
    }

    pub fn classify(&self, prefs: &SliderInput) -> Result<PersonaClassification, StageError> {
        let vector = Self::normalize(prefs)?;
        let (nearest, distance) = Self::nearest_prototype(&vector);
        let distance_confidence = Self::distance_confidence(distance);

        let (persona_type, mut confidence, path, mut reason) =
            match self.rules.as_ref().and_then(|r| r.rule_for(nearest).map(|rule| (r, rule))) {
                Some((rules, rule)) => {
                    let min_confidence = rule
                        .min_confidence
                        .unwrap_or(self.policy.default_min_confidence);

                    if rule.bounds_hold(&vector) && distance_confidence >= min_confidence {
                        (
                            nearest,
                            distance_confidence,
                            ClassificationPath::RuleConfirmed,
                            format!("rule satisfied: {}", nearest),
                        )
                    } else {
                        let fallback = rules.fallback_persona();
                        (
                            fallback,
                            self.policy.fallback_confidence,
                            ClassificationPath::RuleFallback,
                            format!("rule not met for {}, fallback: {}", nearest, fallback),
                        )
                    }
                }
                None => (
                    nearest,
                    distance_confidence,
                    ClassificationPath::PrototypeMatch,
                    format!("nearest prototype: {} (distance {:.2})", nearest, distance),
                ),
            };

        let candidates = self
            .retriever
            .as_ref()
            .map(|retriever| retriever.persona_candidates(&vector))
            .unwrap_or_default();

        let retrieval_blended = !candidates.is_empty();
        if retrieval_blended {
            let best_similarity = candidates
                .iter()
                .map(|c| c.similarity.clamp(0.0, 1.0))
                .fold(0.0_f64, f64::max);
            confidence = self.policy.rule_blend_weight * confidence
                + self.policy.retrieval_blend_weight * best_similarity;
            reason.push_str(&format!(
                " + retrieval blended (max similarity {:.3})",
                best_similarity
            ));
        }

        let confidence = confidence.clamp(0.0, 1.0);

        tracing::info!(
            persona = %persona_type,
            confidence = confidence,
            path = ?path,
            candidates = candidates.len(),
            "Persona classified"
        );

        Ok(PersonaClassification {
            persona_type,
            confidence,
            vector,
            matched_prototype: persona_type.prototype(),
            reason,
            path,
            retrieval_blended,
            candidates,
        })
    }
}
