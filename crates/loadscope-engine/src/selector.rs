//! Weighted scenario selection

use loadscope_core::{validate_scenarios, CoreError, CoreResult, ScenarioTemplate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Picks a scenario per virtual-user iteration, proportionally to weight.
#[derive(Debug, Clone)]
pub struct ScenarioSelector {
    scenarios: Vec<ScenarioTemplate>,
    index: WeightedIndex<f64>,
}

impl ScenarioSelector {
    /// Build a selector over a validated scenario list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty list or unusable weights.
    pub fn new(scenarios: Vec<ScenarioTemplate>) -> CoreResult<Self> {
        validate_scenarios(&scenarios)?;

        let index = WeightedIndex::new(scenarios.iter().map(ScenarioTemplate::effective_weight))
            .map_err(|e| CoreError::invalid_config(format!("invalid scenario weights: {}", e)))?;

        Ok(Self { scenarios, index })
    }

    /// Choose a scenario using the thread-local RNG.
    pub fn select(&self) -> &ScenarioTemplate {
        self.select_with(&mut rand::thread_rng())
    }

    /// Choose a scenario using the supplied RNG.
    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &ScenarioTemplate {
        &self.scenarios[self.index.sample(rng)]
    }

    pub fn scenarios(&self) -> &[ScenarioTemplate] {
        &self.scenarios
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_selection_follows_weights() {
        let selector = ScenarioSelector::new(vec![
            ScenarioTemplate::new("search", json!({})).with_weight(7.0),
            ScenarioTemplate::new("insert", json!({})).with_weight(2.0),
            ScenarioTemplate::new("metadata", json!({})),
        ])
        .unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            match selector.select_with(&mut rng).name.as_str() {
                "search" => counts[0] += 1,
                "insert" => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }

        // ~70% / ~20% / ~10% with generous tolerance
        assert!(counts[0] > 6_500 && counts[0] < 7_500, "{counts:?}");
        assert!(counts[1] > 1_600 && counts[1] < 2_400, "{counts:?}");
        assert!(counts[2] > 700 && counts[2] < 1_300, "{counts:?}");
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let selector = ScenarioSelector::new(vec![
            ScenarioTemplate::new("never", json!({})).with_weight(0.0),
            ScenarioTemplate::new("always", json!({})),
        ])
        .unwrap();

        for _ in 0..500 {
            assert_eq!(selector.select().name, "always");
        }
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(
            ScenarioSelector::new(Vec::new()),
            Err(CoreError::InvalidConfig { .. })
        ));
    }
}
