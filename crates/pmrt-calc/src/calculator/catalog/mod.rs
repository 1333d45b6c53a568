mod parser;

use super::error::{AssetLoadError, ConfigurationError};
use super::MISSING_SENTINEL;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Widget family declared for a feature in the metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureDtype {
    Categorical,
    Ordinal,
    Checkbox,
    Real,
    Integer,
}

impl FeatureDtype {
    pub fn parse(feature: &str, raw: &str) -> Result<Self, ConfigurationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "categorical" => Ok(Self::Categorical),
            "ordinal" => Ok(Self::Ordinal),
            "checkbox" => Ok(Self::Checkbox),
            "real" => Ok(Self::Real),
            "integer" => Ok(Self::Integer),
            _ => Err(ConfigurationError::UnrecognizedDtype {
                feature: feature.to_string(),
                dtype: raw.to_string(),
            }),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::Ordinal => "ordinal",
            Self::Checkbox => "checkbox",
            Self::Real => "real",
            Self::Integer => "integer",
        }
    }
}

/// Metadata for one model input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDescriptor {
    pub name: String,
    pub section: String,
    /// Dtype text as written in the metadata table; see [`FeatureDescriptor::kind`].
    pub dtype: String,
    pub label: String,
    pub options: Vec<f64>,
    pub options_str: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

/// An option paired with its parsed description token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionChoice {
    pub value: f64,
    pub code: Option<String>,
    pub description: String,
}

impl FeatureDescriptor {
    pub fn kind(&self) -> Result<FeatureDtype, ConfigurationError> {
        FeatureDtype::parse(&self.name, &self.dtype)
    }

    /// Options with their human-readable descriptions, in table order.
    pub fn choices(&self) -> Vec<OptionChoice> {
        let tokens = parser::split_descriptions(&self.options_str);
        self.options
            .iter()
            .enumerate()
            .map(|(position, value)| {
                let (code, description) = tokens
                    .get(position)
                    .map(|token| parser::split_token(token))
                    .unwrap_or((None, ""));
                OptionChoice {
                    value: *value,
                    code: code.map(str::to_string),
                    description: description.to_string(),
                }
            })
            .collect()
    }

    pub fn description_of(&self, value: f64) -> Option<String> {
        self.choices()
            .into_iter()
            .find(|choice| choice.value == value)
            .map(|choice| choice.description)
    }

    fn without_missing_option(mut self) -> Self {
        let tokens = parser::split_descriptions(&self.options_str);
        if tokens.len() != self.options.len() {
            self.options.retain(|value| *value != MISSING_SENTINEL);
            return self;
        }

        let (options, kept): (Vec<f64>, Vec<&str>) = self
            .options
            .iter()
            .zip(tokens)
            .filter(|(value, _)| **value != MISSING_SENTINEL)
            .map(|(value, token)| (*value, token))
            .unzip();
        let options_str = kept.join("|");

        self.options = options;
        self.options_str = options_str;
        self
    }
}

/// Lookup table over the feature metadata spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    descriptors: Vec<FeatureDescriptor>,
    index: HashMap<String, usize>,
}

impl MetadataCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetLoadError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| AssetLoadError::io(path, source))?;
        Self::parse(file, path)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AssetLoadError> {
        Self::parse(reader, Path::new("<metadata>"))
    }

    fn parse<R: Read>(reader: R, origin: &Path) -> Result<Self, AssetLoadError> {
        let descriptors = parser::parse_descriptors(reader, origin)?;
        Ok(Self::from_descriptors(descriptors)?)
    }

    pub fn from_descriptors(
        descriptors: Vec<FeatureDescriptor>,
    ) -> Result<Self, ConfigurationError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (position, descriptor) in descriptors.iter().enumerate() {
            if index.insert(descriptor.name.clone(), position).is_some() {
                return Err(ConfigurationError::DuplicateFeature {
                    table: "metadata",
                    feature: descriptor.name.clone(),
                });
            }
        }
        Ok(Self { descriptors, index })
    }

    /// Find the descriptor for `feature`.
    ///
    /// With `include_missing_option` false the `-1` option and its description
    /// are dropped, which is what summaries want once a fallback has been
    /// substituted.
    pub fn lookup(
        &self,
        feature: &str,
        include_missing_option: bool,
    ) -> Result<FeatureDescriptor, ConfigurationError> {
        let descriptor = self
            .index
            .get(feature)
            .map(|position| self.descriptors[*position].clone())
            .ok_or_else(|| ConfigurationError::MissingMetadata(feature.to_string()))?;

        if include_missing_option {
            Ok(descriptor)
        } else {
            Ok(descriptor.without_missing_option())
        }
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.index.contains_key(feature)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
