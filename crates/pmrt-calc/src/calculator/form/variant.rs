use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a numeric control shows before the user touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelMode {
    /// Start at `-1` ("unknown"); the control's minimum extends to `-1`.
    Sentinel,
    /// Start at the feature's fallback average.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptDisplay {
    Shown,
    Hidden,
}

/// Knobs that distinguish the deployed flavours of the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormVariant {
    pub intercept_display: InterceptDisplay,
    /// Features pinned to a constant instead of being asked.
    pub fixed_values: BTreeMap<String, f64>,
    pub rounding_base: f64,
    pub sentinel_mode: SentinelMode,
    /// Range used for numeric features whose metadata gives no bounds.
    pub default_lower_bound: f64,
    pub default_upper_bound: f64,
    pub outcome_label: String,
}

impl Default for FormVariant {
    fn default() -> Self {
        Self {
            intercept_display: InterceptDisplay::Shown,
            fixed_values: BTreeMap::new(),
            rounding_base: 0.1,
            sentinel_mode: SentinelMode::Sentinel,
            default_lower_bound: 0.0,
            default_upper_bound: 100.0,
            outcome_label: "PMRT".to_string(),
        }
    }
}

impl FormVariant {
    pub fn is_fixed(&self, feature: &str) -> bool {
        self.fixed_values.contains_key(feature)
    }
}
