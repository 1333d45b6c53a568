use std::path::PathBuf;

/// Fatal problems with the model tables or the form variant. None of these are
/// recoverable at runtime; the form must not be built and nothing is scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error(
        "coefficient tables disagree: only standardized [{}], only unstandardized [{}]",
        .only_standardized.join(", "),
        .only_unstandardized.join(", ")
    )]
    FeatureSetMismatch {
        only_standardized: Vec<String>,
        only_unstandardized: Vec<String>,
    },
    #[error("feature {feature} appears more than once in the {table} table")]
    DuplicateFeature { table: &'static str, feature: String },
    #[error("coefficient tables have no intercept row")]
    MissingIntercept,
    #[error("no metadata row for feature {0}")]
    MissingMetadata(String),
    #[error("no fallback average for feature {0}")]
    MissingFallback(String),
    #[error("feature {feature} declares unrecognized dtype '{dtype}'")]
    UnrecognizedDtype { feature: String, dtype: String },
    #[error("feature {feature} has {options} options but {descriptions} descriptions")]
    MisalignedOptions {
        feature: String,
        options: usize,
        descriptions: usize,
    },
    #[error("feature {0} is a choice but lists no options")]
    NoOptions(String),
    #[error("feature {feature} has lower bound {lower} above upper bound {upper}")]
    InvalidBounds {
        feature: String,
        lower: f64,
        upper: f64,
    },
    #[error("feature {feature} has an unreadable option '{raw}'")]
    InvalidOption { feature: String, raw: String },
    #[error("fixed value given for {0}, which is not a model feature")]
    UnknownFixedFeature(String),
    #[error("rounding base must be positive and finite, got {0}")]
    InvalidRoundingBase(f64),
    #[error("submission has no value for feature {0}")]
    IncompleteSubmission(String),
}

/// Failure while reading one of the static tables.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid table data in {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("{}, line {line}: {detail}", .path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        detail: String,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl AssetLoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// A raw answer that no form control could have produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("{feature}: {value} is not one of the permitted options")]
    NotAnOption { feature: String, value: f64 },
    #[error("{feature}: {value} is outside [{lower}, {upper}]")]
    OutOfBounds {
        feature: String,
        value: f64,
        lower: f64,
        upper: f64,
    },
    #[error("{feature}: {value} is not a whole number")]
    NotAnInteger { feature: String, value: f64 },
    #[error("{feature}: checkbox answers must be 0 or 1, got {value}")]
    NotABoolean { feature: String, value: f64 },
    #[error("{feature}: value must be a finite number")]
    NotFinite { feature: String },
    #[error("{0} is not a model input")]
    UnknownFeature(String),
}

/// Umbrella error for shells driving the calculator.
#[derive(Debug, thiserror::Error)]
pub enum CalculatorError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Load(#[from] AssetLoadError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("model '{0}' is not available")]
    UnknownModel(String),
    #[error("form input failed: {0}")]
    Io(#[from] std::io::Error),
}
