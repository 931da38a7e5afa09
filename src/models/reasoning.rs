use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

/// One recorded stage of the ranking rationale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub label: String,
    pub details: Value,
}

/// Ordered chain of reasoning steps explaining why items ranked where they did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    pub steps: Vec<ReasoningStep>,
    /// Rendered explanation of the final result, filled in by the ranker
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub explanation: String,
}

impl ReasoningTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, label: impl Into<String>, details: Value) {
        self.steps.push(ReasoningStep {
            label: label.into(),
            details,
        });
    }

    pub fn step(&self, label: &str) -> Option<&ReasoningStep> {
        self.steps.iter().find(|s| s.label == label)
    }

    /// Renders the steps as a numbered plain-text summary
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            let _ = write!(out, "{}. {}", i + 1, step.label);
            if let Value::Object(map) = &step.details {
                let parts: Vec<String> = map
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, render_value(value)))
                    .collect();
                if !parts.is_empty() {
                    let _ = write!(out, ": {}", parts.join(", "));
                }
            } else if !step.details.is_null() {
                let _ = write!(out, ": {}", render_value(&step.details));
            }
            out.push('\n');
        }
        out
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.3}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_numbers_steps_in_order() {
        let mut trace = ReasoningTrace::new();
        trace.add_step("Input analysis", json!({ "total_items": 3 }));
        trace.add_step("Normalization", json!({ "method": "min-max" }));

        let rendered = trace.render();
        assert_eq!(
            rendered,
            "1. Input analysis: total_items=3\n2. Normalization: method=min-max\n"
        );
    }

    #[test]
    fn test_render_formats_floats() {
        let mut trace = ReasoningTrace::new();
        trace.add_step("Weights", json!({ "confidence_factor": 0.8766 }));
        assert_eq!(trace.render(), "1. Weights: confidence_factor=0.877\n");
    }

    #[test]
    fn test_step_lookup_by_label() {
        let mut trace = ReasoningTrace::new();
        trace.add_step("Final ranking", json!({ "top_item": "Camera" }));
        assert!(trace.step("Final ranking").is_some());
        assert!(trace.step("Missing").is_none());
    }
}
