//! Form construction and answer resolution.
//!
//! The engine walks the model's features in influence order, picks a control
//! for each from its metadata, asks a [`WidgetProvider`] for the answer and
//! replaces the missing sentinel with the feature's fallback average.

mod variant;
mod widgets;

pub use variant::{FormVariant, InterceptDisplay, SentinelMode};
pub use widgets::{FormField, RawInputs, SliderSpec, Widget, WidgetProvider};

use super::catalog::{FeatureDtype, MetadataCatalog};
use super::error::{CalculatorError, ConfigurationError, InputError};
use super::model::{CoefficientModel, FallbackTable};
use super::MISSING_SENTINEL;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Where a stored value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Collected,
    Fallback,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedValue {
    pub value: f64,
    pub source: ValueSource,
}

/// Resolved answers of one render pass, keyed by feature name. Never contains
/// the missing sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormSubmission {
    values: BTreeMap<String, ResolvedValue>,
}

impl FormSubmission {
    fn insert(&mut self, feature: &str, value: f64, source: ValueSource) {
        self.values
            .insert(feature.to_string(), ResolvedValue { value, source });
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.values.get(feature).map(|resolved| resolved.value)
    }

    pub fn resolved(&self, feature: &str) -> Option<&ResolvedValue> {
        self.values.get(feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.values
            .iter()
            .map(|(feature, resolved)| (feature.as_str(), resolved))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build a submission from values that are already resolved.
impl FromIterator<(String, f64)> for FormSubmission {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(feature, value)| {
                let resolved = ResolvedValue {
                    value,
                    source: ValueSource::Collected,
                };
                (feature, resolved)
            })
            .collect();
        Self { values }
    }
}

/// Form builder over immutable model data.
pub struct FormEngine<'a> {
    model: &'a CoefficientModel,
    catalog: &'a MetadataCatalog,
    fallbacks: &'a FallbackTable,
    variant: &'a FormVariant,
}

impl<'a> FormEngine<'a> {
    pub fn new(
        model: &'a CoefficientModel,
        catalog: &'a MetadataCatalog,
        fallbacks: &'a FallbackTable,
        variant: &'a FormVariant,
    ) -> Result<Self, ConfigurationError> {
        if let Some(feature) = variant
            .fixed_values
            .keys()
            .find(|feature| !model.ordered_features().contains(*feature))
        {
            return Err(ConfigurationError::UnknownFixedFeature(feature.clone()));
        }

        Ok(Self {
            model,
            catalog,
            fallbacks,
            variant,
        })
    }

    pub fn variant(&self) -> &FormVariant {
        self.variant
    }

    /// The intercept line shown above the form, if this variant shows one.
    pub fn intercept_row(&self) -> Option<f64> {
        match self.variant.intercept_display {
            InterceptDisplay::Shown => Some(self.model.intercept_value()),
            InterceptDisplay::Hidden => None,
        }
    }

    /// Controls for every asked feature, in presentation order. Fails on the
    /// first feature whose metadata or fallback is unusable.
    pub fn fields(&self) -> Result<Vec<FormField>, ConfigurationError> {
        self.model
            .ordered_features()
            .iter()
            .filter(|feature| !self.variant.is_fixed(feature))
            .map(|feature| self.field(feature))
            .collect()
    }

    fn field(&self, feature: &str) -> Result<FormField, ConfigurationError> {
        let descriptor = self.catalog.lookup(feature, true)?;
        let dtype = descriptor.kind()?;
        let fallback = self.fallbacks.resolved(feature)?;

        let widget = match dtype {
            FeatureDtype::Categorical | FeatureDtype::Ordinal => {
                let choices = descriptor.choices();
                let initial = choices
                    .first()
                    .map(|choice| choice.value)
                    .ok_or_else(|| ConfigurationError::NoOptions(feature.to_string()))?;
                if dtype == FeatureDtype::Categorical {
                    Widget::Categorical { choices, initial }
                } else {
                    Widget::Ordinal { choices, initial }
                }
            }
            FeatureDtype::Checkbox => Widget::Checkbox,
            FeatureDtype::Real => Widget::Real(self.slider(
                feature,
                (descriptor.lower_bound, descriptor.upper_bound),
                0.01,
                fallback,
            )?),
            FeatureDtype::Integer => Widget::Integer(self.slider(
                feature,
                (descriptor.lower_bound, descriptor.upper_bound),
                1.0,
                fallback.round(),
            )?),
        };

        Ok(FormField {
            feature: feature.to_string(),
            section: descriptor.section,
            label: descriptor.label,
            fallback,
            widget,
        })
    }

    fn slider(
        &self,
        feature: &str,
        (lower, upper): (Option<f64>, Option<f64>),
        step: f64,
        fallback_initial: f64,
    ) -> Result<SliderSpec, ConfigurationError> {
        let lower = lower.unwrap_or(self.variant.default_lower_bound);
        let upper = upper.unwrap_or(self.variant.default_upper_bound);
        if lower > upper {
            return Err(ConfigurationError::InvalidBounds {
                feature: feature.to_string(),
                lower,
                upper,
            });
        }

        let (initial, allows_missing) = match self.variant.sentinel_mode {
            SentinelMode::Sentinel => (MISSING_SENTINEL, true),
            SentinelMode::Fallback => (fallback_initial.clamp(lower, upper), false),
        };

        Ok(SliderSpec {
            lower,
            upper,
            step,
            initial,
            allows_missing,
        })
    }

    /// Show every control through `provider` and resolve the answers.
    ///
    /// All controls are built before the first question is asked, so a
    /// configuration problem never leaves a half-filled submission behind.
    pub fn render<W>(&self, provider: &mut W) -> Result<FormSubmission, CalculatorError>
    where
        W: WidgetProvider,
        CalculatorError: From<W::Error>,
    {
        let fields = self.fields()?;
        let mut fields = fields.into_iter().peekable();
        let mut submission = FormSubmission::default();

        for feature in self.model.ordered_features() {
            if let Some(value) = self.variant.fixed_values.get(feature) {
                submission.insert(feature, *value, ValueSource::Fixed);
                continue;
            }

            let field = match fields.next_if(|field| &field.feature == feature) {
                Some(field) => field,
                None => return Err(ConfigurationError::MissingMetadata(feature.clone()).into()),
            };

            let raw = collect(provider, &field)?;
            if raw == MISSING_SENTINEL {
                debug!(
                    feature = %field.feature,
                    fallback = field.fallback,
                    "missing answer replaced"
                );
                submission.insert(feature, field.fallback, ValueSource::Fallback);
            } else {
                validate(&field, raw)?;
                submission.insert(feature, raw, ValueSource::Collected);
            }
        }

        Ok(submission)
    }

    /// Resolve a prepared `feature -> number` map without any interaction.
    pub fn resolve(
        &self,
        raw_inputs: &BTreeMap<String, f64>,
    ) -> Result<FormSubmission, CalculatorError> {
        for feature in raw_inputs.keys() {
            if !self.model.ordered_features().contains(feature) {
                return Err(InputError::UnknownFeature(feature.clone()).into());
            }
            if self.variant.is_fixed(feature) {
                debug!(%feature, "ignoring answer for a fixed feature");
            }
        }

        self.render(&mut RawInputs::new(raw_inputs))
    }
}

fn collect<W: WidgetProvider>(provider: &mut W, field: &FormField) -> Result<f64, W::Error> {
    match &field.widget {
        Widget::Categorical { choices, .. } => provider.categorical(field, choices),
        Widget::Ordinal { choices, .. } => provider.ordinal(field, choices),
        Widget::Checkbox => provider
            .checkbox(field)
            .map(|checked| if checked { 1.0 } else { 0.0 }),
        Widget::Real(spec) => provider.real(field, spec),
        Widget::Integer(spec) => provider.integer(field, spec).map(|value| value as f64),
    }
}

fn validate(field: &FormField, raw: f64) -> Result<(), InputError> {
    let feature = || field.feature.clone();

    if !raw.is_finite() {
        return Err(InputError::NotFinite { feature: feature() });
    }

    match &field.widget {
        Widget::Categorical { choices, .. } | Widget::Ordinal { choices, .. } => {
            if choices.iter().any(|choice| choice.value == raw) {
                Ok(())
            } else {
                Err(InputError::NotAnOption {
                    feature: feature(),
                    value: raw,
                })
            }
        }
        Widget::Checkbox => Ok(()),
        Widget::Real(spec) | Widget::Integer(spec) => {
            if spec.contains(raw) {
                Ok(())
            } else {
                Err(InputError::OutOfBounds {
                    feature: feature(),
                    value: raw,
                    lower: spec.lower,
                    upper: spec.upper,
                })
            }
        }
    }
}
