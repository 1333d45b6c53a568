//! Form generation and logistic scoring over static model tables.

mod assets;
pub mod catalog;
mod error;
pub mod form;
mod model;
pub mod report;
mod score;
mod tables;

#[cfg(test)]
mod tests;

/// Raw answer meaning "unknown"; always replaced by the fallback average.
pub const MISSING_SENTINEL: f64 = -1.0;

pub use assets::{AssetRegistry, Calculation, CalculatorAssets, DataLayout};
pub use catalog::{FeatureDescriptor, FeatureDtype, MetadataCatalog, OptionChoice};
pub use error::{AssetLoadError, CalculatorError, ConfigurationError, InputError};
pub use form::{
    FormEngine, FormField, FormSubmission, FormVariant, InterceptDisplay, RawInputs,
    ResolvedValue, SentinelMode, SliderSpec, ValueSource, Widget, WidgetProvider,
};
pub use model::{CoefficientEntry, CoefficientModel, FallbackTable, INTERCEPT};
pub use report::CalculationReport;
pub use score::{
    logistic, round_to_base, Contribution, ScoreEngine, ScoreResult, DEFAULT_ROUNDING_BASE,
};
