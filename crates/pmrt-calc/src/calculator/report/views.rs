use super::super::form::ValueSource;
use serde::Serialize;

/// One answered feature as shown back to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnteredValueView {
    pub feature: String,
    pub section: String,
    pub label: String,
    pub value: f64,
    pub source: ValueSource,
    /// Option description for choice answers, when one matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EnteredValueView {
    pub fn note(&self) -> Option<String> {
        match self.source {
            ValueSource::Collected => self.description.clone(),
            ValueSource::Fallback => Some("missing value, using the average".to_string()),
            ValueSource::Fixed => Some("fixed by model variant".to_string()),
        }
    }
}

/// `coefficient * value` for one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationTermView {
    pub feature: String,
    pub coefficient: f64,
    pub value: f64,
    pub contribution: f64,
}

impl CalculationTermView {
    pub fn line(&self) -> String {
        format!(
            "+ {:.5} * {} ({})",
            self.coefficient, self.value, self.feature
        )
    }
}
