use super::super::catalog::{FeatureDtype, OptionChoice};
use super::super::error::InputError;
use super::super::MISSING_SENTINEL;
use serde::Serialize;
use std::collections::BTreeMap;

/// Bounds and starting point of a numeric control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderSpec {
    /// Smallest real answer.
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
    pub initial: f64,
    /// Whether the control also offers `-1` for "unknown".
    pub allows_missing: bool,
}

impl SliderSpec {
    /// Minimum the control itself exposes.
    pub fn control_min(&self) -> f64 {
        if self.allows_missing {
            MISSING_SENTINEL.min(self.lower)
        } else {
            self.lower
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    Categorical {
        choices: Vec<OptionChoice>,
        initial: f64,
    },
    Ordinal {
        choices: Vec<OptionChoice>,
        initial: f64,
    },
    Checkbox,
    Real(SliderSpec),
    Integer(SliderSpec),
}

impl Widget {
    pub fn dtype(&self) -> FeatureDtype {
        match self {
            Widget::Categorical { .. } => FeatureDtype::Categorical,
            Widget::Ordinal { .. } => FeatureDtype::Ordinal,
            Widget::Checkbox => FeatureDtype::Checkbox,
            Widget::Real(_) => FeatureDtype::Real,
            Widget::Integer(_) => FeatureDtype::Integer,
        }
    }
}

/// One control of the rendered form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub feature: String,
    pub section: String,
    pub label: String,
    /// Value stored when the answer is the missing sentinel.
    pub fallback: f64,
    pub widget: Widget,
}

impl FormField {
    pub fn prompt(&self) -> String {
        if self.label.is_empty() {
            self.feature.clone()
        } else {
            format!("{}: {}", self.feature, self.label)
        }
    }
}

/// Rendering technology behind the form. Each method shows one control and
/// returns the raw answer; the engine handles sentinel substitution.
pub trait WidgetProvider {
    type Error;

    fn categorical(&mut self, field: &FormField, choices: &[OptionChoice])
        -> Result<f64, Self::Error>;

    fn ordinal(&mut self, field: &FormField, choices: &[OptionChoice]) -> Result<f64, Self::Error>;

    fn checkbox(&mut self, field: &FormField) -> Result<bool, Self::Error>;

    fn real(&mut self, field: &FormField, spec: &SliderSpec) -> Result<f64, Self::Error>;

    fn integer(&mut self, field: &FormField, spec: &SliderSpec) -> Result<i64, Self::Error>;
}

/// Provider answering from a prepared `feature -> number` map, as submitted
/// over HTTP or read from a JSON file. Absent answers become the sentinel
/// (unchecked for checkboxes).
pub struct RawInputs<'a> {
    values: &'a BTreeMap<String, f64>,
}

impl<'a> RawInputs<'a> {
    pub fn new(values: &'a BTreeMap<String, f64>) -> Self {
        Self { values }
    }

    fn raw(&self, field: &FormField) -> Result<Option<f64>, InputError> {
        match self.values.get(&field.feature) {
            Some(value) if !value.is_finite() => Err(InputError::NotFinite {
                feature: field.feature.clone(),
            }),
            Some(value) => Ok(Some(*value)),
            None => Ok(None),
        }
    }
}

impl WidgetProvider for RawInputs<'_> {
    type Error = InputError;

    fn categorical(
        &mut self,
        field: &FormField,
        _choices: &[OptionChoice],
    ) -> Result<f64, InputError> {
        Ok(self.raw(field)?.unwrap_or(MISSING_SENTINEL))
    }

    fn ordinal(&mut self, field: &FormField, _choices: &[OptionChoice]) -> Result<f64, InputError> {
        Ok(self.raw(field)?.unwrap_or(MISSING_SENTINEL))
    }

    fn checkbox(&mut self, field: &FormField) -> Result<bool, InputError> {
        match self.raw(field)? {
            None => Ok(false),
            Some(value) if value == 0.0 => Ok(false),
            Some(value) if value == 1.0 => Ok(true),
            Some(value) => Err(InputError::NotABoolean {
                feature: field.feature.clone(),
                value,
            }),
        }
    }

    fn real(&mut self, field: &FormField, _spec: &SliderSpec) -> Result<f64, InputError> {
        Ok(self.raw(field)?.unwrap_or(MISSING_SENTINEL))
    }

    fn integer(&mut self, field: &FormField, _spec: &SliderSpec) -> Result<i64, InputError> {
        let value = self.raw(field)?.unwrap_or(MISSING_SENTINEL);
        if value.fract() != 0.0 {
            return Err(InputError::NotAnInteger {
                feature: field.feature.clone(),
                value,
            });
        }
        Ok(value as i64)
    }
}
