//! Denial pattern catalogue: named pattern → base weight in [0, 1].
//!
//! Modeled as configuration data so payer-specific weights can vary
//! without code changes. Loaded once at startup, immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MISSING_PRIOR_AUTH: &str = "missing_prior_auth";
pub const MISSING_DIAGNOSIS: &str = "missing_diagnosis";
pub const INVALID_DIAGNOSIS: &str = "invalid_diagnosis";
pub const FREQUENCY_EXCEEDED: &str = "frequency_exceeded";
pub const INVALID_MODIFIER: &str = "invalid_modifier";
pub const TIMELY_FILING: &str = "timely_filing";
pub const DUPLICATE_CLAIM: &str = "duplicate_claim";
pub const PLAN_EXCLUSION: &str = "plan_exclusion";
pub const MISSING_MODIFIER: &str = "missing_modifier";
pub const EXCLUDED_SERVICE: &str = "excluded_service";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenialPatternTable {
    weights: HashMap<String, f64>,
}

impl DenialPatternTable {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Base weight for a pattern; unknown patterns carry a neutral 0.5.
    pub fn weight(&self, pattern: &str) -> f64 {
        self.weights.get(pattern).copied().unwrap_or(0.5)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.weights.contains_key(pattern)
    }
}

impl Default for DenialPatternTable {
    fn default() -> Self {
        let weights = [
            (MISSING_PRIOR_AUTH, 0.9),
            (MISSING_DIAGNOSIS, 0.8),
            (INVALID_DIAGNOSIS, 0.7),
            (FREQUENCY_EXCEEDED, 0.8),
            (INVALID_MODIFIER, 0.6),
            (TIMELY_FILING, 0.95),
            (DUPLICATE_CLAIM, 0.85),
            (PLAN_EXCLUSION, 0.9),
            (MISSING_MODIFIER, 0.5),
            (EXCLUDED_SERVICE, 0.9),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();
        Self { weights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_carries_the_catalogue() {
        let table = DenialPatternTable::default();
        assert_eq!(table.weight(TIMELY_FILING), 0.95);
        assert_eq!(table.weight(MISSING_PRIOR_AUTH), 0.9);
        assert_eq!(table.weight("unheard_of"), 0.5);
    }

    #[test]
    fn table_loads_from_json() {
        let table =
            DenialPatternTable::from_json(r#"{"weights": {"timely_filing": 0.99}}"#).unwrap();
        assert_eq!(table.weight(TIMELY_FILING), 0.99);
    }
}
