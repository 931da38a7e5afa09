use serde::Deserialize;
use std::{collections::HashMap, path::Path};

use crate::{
    error::ConfigError,
    models::{PersonaAxis, PersonaType, PersonaVector},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Min,
    Max,
}

/// A single `min_<axis>` / `max_<axis>` condition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBound {
    pub axis: PersonaAxis,
    pub kind: BoundKind,
    pub value: f64,
}

impl AxisBound {
    pub fn holds(&self, vector: &PersonaVector) -> bool {
        let actual = vector.get(self.axis);
        match self.kind {
            BoundKind::Min => actual >= self.value,
            BoundKind::Max => actual <= self.value,
        }
    }
}

/// Conditions a buyer vector must satisfy to keep a persona label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaRule {
    pub bounds: Vec<AxisBound>,
    /// Minimum prototype-distance confidence; the policy default applies when unset
    pub min_confidence: Option<f64>,
}

impl PersonaRule {
    pub fn bounds_hold(&self, vector: &PersonaVector) -> bool {
        self.bounds.iter().all(|bound| bound.holds(vector))
    }

    pub fn with_min(mut self, axis: PersonaAxis, value: f64) -> Self {
        self.bounds.push(AxisBound {
            axis,
            kind: BoundKind::Min,
            value,
        });
        self
    }

    pub fn with_max(mut self, axis: PersonaAxis, value: f64) -> Self {
        self.bounds.push(AxisBound {
            axis,
            kind: BoundKind::Max,
            value,
        });
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }
}

/// Persona rule table plus the fallback persona, loaded once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct RulesConfig {
    rules: HashMap<PersonaType, PersonaRule>,
    fallback_persona: PersonaType,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            fallback_persona: PersonaType::HybridTrade,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    persona_rules: HashMap<String, HashMap<String, f64>>,
    #[serde(default)]
    persona_thresholds: ThresholdsSection,
}

#[derive(Debug, Default, Deserialize)]
struct ThresholdsSection {
    #[serde(default)]
    fallback_persona: Option<String>,
}

impl RulesConfig {
    /// Loads the rules file from disk
    ///
    /// A missing file is reported as `ConfigError::Missing` so callers can
    /// degrade to prototype-only classification.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::Missing(path.display().to_string())
            } else {
                ConfigError::Unreadable(e)
            }
        })?;

        let config = Self::from_json_str(&contents)?;

        tracing::info!(
            path = %path.display(),
            rule_count = config.rules.len(),
            fallback = %config.fallback_persona,
            "Loaded persona rules"
        );

        Ok(config)
    }

    /// Parses rules JSON; unknown personas and keys are logged and skipped
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: RulesFile = serde_json::from_str(json)?;
        let mut rules = HashMap::new();

        for (persona_name, conditions) in file.persona_rules {
            let persona = match persona_name.parse::<PersonaType>() {
                Ok(persona) => persona,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring rule for unknown persona");
                    continue;
                }
            };

            let mut rule = PersonaRule::default();
            for (key, value) in conditions {
                if key == "min_confidence" {
                    rule.min_confidence = Some(value);
                } else if let Some(bound) = parse_bound(&key, value) {
                    rule.bounds.push(bound);
                } else {
                    tracing::warn!(persona = %persona, key = %key, "Ignoring unrecognized rule key");
                }
            }
            // HashMap iteration order is arbitrary; keep bounds stable for logging and tests
            rule.bounds
                .sort_by_key(|b| (b.axis.as_str(), matches!(b.kind, BoundKind::Max)));
            rules.insert(persona, rule);
        }

        let fallback_persona = match file.persona_thresholds.fallback_persona {
            Some(name) => name.parse::<PersonaType>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Unknown fallback persona, using hybrid_trade");
                PersonaType::HybridTrade
            }),
            None => PersonaType::HybridTrade,
        };

        Ok(Self {
            rules,
            fallback_persona,
        })
    }

    pub fn with_rule(mut self, persona: PersonaType, rule: PersonaRule) -> Self {
        self.rules.insert(persona, rule);
        self
    }

    pub fn with_fallback(mut self, persona: PersonaType) -> Self {
        self.fallback_persona = persona;
        self
    }

    pub fn rule_for(&self, persona: PersonaType) -> Option<&PersonaRule> {
        self.rules.get(&persona)
    }

    pub fn fallback_persona(&self) -> PersonaType {
        self.fallback_persona
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_bound(key: &str, value: f64) -> Option<AxisBound> {
    let (kind, axis_name) = if let Some(axis) = key.strip_prefix("min_") {
        (BoundKind::Min, axis)
    } else if let Some(axis) = key.strip_prefix("max_") {
        (BoundKind::Max, axis)
    } else {
        return None;
    };

    let axis = axis_name.parse::<PersonaAxis>().ok()?;
    Some(AxisBound { axis, kind, value })
}
