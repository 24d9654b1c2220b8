//! Request templates issued by virtual users.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A named request payload with a relative selection weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTemplate {
    /// Scenario name, copied onto every [`RequestResult`](crate::RequestResult).
    pub name: String,

    /// Opaque payload handed to the target on submit.
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Relative weight (default: 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl ScenarioTemplate {
    /// Create a template with the default weight.
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
            weight: None,
        }
    }

    /// Set an explicit selection weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Weight used for selection.
    #[must_use]
    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// Validate a scenario list before a run is allowed to start.
///
/// # Errors
///
/// Returns `InvalidConfig` when the list is empty, a weight is negative or
/// not finite, or every weight is zero.
pub fn validate_scenarios(scenarios: &[ScenarioTemplate]) -> CoreResult<()> {
    if scenarios.is_empty() {
        return Err(CoreError::invalid_config(
            "at least one scenario is required",
        ));
    }

    for scenario in scenarios {
        let weight = scenario.effective_weight();
        if !weight.is_finite() || weight < 0.0 {
            return Err(CoreError::invalid_config(format!(
                "scenario `{}` has invalid weight {}",
                scenario.name, weight
            )));
        }
    }

    if scenarios.iter().all(|s| s.effective_weight() == 0.0) {
        return Err(CoreError::invalid_config(
            "at least one scenario must have a positive weight",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn weight_defaults_to_one() {
        let scenario = ScenarioTemplate::new("chat", json!({"prompt": "hi"}));
        assert_eq!(scenario.effective_weight(), 1.0);
    }

    #[test]
    fn empty_scenarios_rejected() {
        assert!(matches!(
            validate_scenarios(&[]),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn bad_weights_rejected() {
        let negative = vec![ScenarioTemplate::new("a", json!(null)).with_weight(-1.0)];
        assert!(validate_scenarios(&negative).is_err());

        let nan = vec![ScenarioTemplate::new("a", json!(null)).with_weight(f64::NAN)];
        assert!(validate_scenarios(&nan).is_err());

        let all_zero = vec![
            ScenarioTemplate::new("a", json!(null)).with_weight(0.0),
            ScenarioTemplate::new("b", json!(null)).with_weight(0.0),
        ];
        assert!(validate_scenarios(&all_zero).is_err());
    }

    #[test]
    fn zero_weight_allowed_alongside_positive() {
        let scenarios = vec![
            ScenarioTemplate::new("a", json!(null)).with_weight(0.0),
            ScenarioTemplate::new("b", json!(null)),
        ];
        assert!(validate_scenarios(&scenarios).is_ok());
    }

    #[test]
    fn deserializes_without_weight() {
        let scenario: ScenarioTemplate =
            serde_json::from_str(r#"{"name": "search", "payload": {"q": "rust"}}"#).unwrap();
        assert_eq!(scenario.weight, None);
        assert_eq!(scenario.payload["q"], "rust");
    }
}
