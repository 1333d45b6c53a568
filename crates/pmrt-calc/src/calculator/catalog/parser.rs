use super::super::error::{AssetLoadError, ConfigurationError};
use super::super::tables::normalize_feature;
use super::{FeatureDescriptor, FeatureDtype};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

pub(crate) fn parse_descriptors<R: Read>(
    reader: R,
    origin: &Path,
) -> Result<Vec<FeatureDescriptor>, AssetLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut descriptors = Vec::new();

    for record in csv_reader.deserialize::<MetadataRow>() {
        let row = record.map_err(|source| AssetLoadError::csv(origin, source))?;
        descriptors.push(row.into_descriptor()?);
    }

    Ok(descriptors)
}

#[derive(Debug, Deserialize)]
struct MetadataRow {
    name: String,
    #[serde(default)]
    section: String,
    dtype: String,
    #[serde(default)]
    label: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    options: Option<String>,
    #[serde(default)]
    options_str: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    lower_bound: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    upper_bound: Option<String>,
}

impl MetadataRow {
    fn into_descriptor(self) -> Result<FeatureDescriptor, ConfigurationError> {
        let name = normalize_feature(&self.name);

        let options = match self.options.as_deref() {
            Some(raw) => raw
                .split('|')
                .map(|token| parse_number(&name, token))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        // Only choice rows are labelled by their tokens; other dtypes ignore options.
        let is_choice = matches!(
            FeatureDtype::parse(&name, &self.dtype),
            Ok(FeatureDtype::Categorical | FeatureDtype::Ordinal)
        );
        if is_choice && !options.is_empty() {
            let descriptions = split_descriptions(&self.options_str).len();
            if descriptions != options.len() {
                return Err(ConfigurationError::MisalignedOptions {
                    feature: name,
                    options: options.len(),
                    descriptions,
                });
            }
        }

        let lower_bound = self
            .lower_bound
            .as_deref()
            .map(|raw| parse_number(&name, raw))
            .transpose()?;
        let upper_bound = self
            .upper_bound
            .as_deref()
            .map(|raw| parse_number(&name, raw))
            .transpose()?;

        Ok(FeatureDescriptor {
            name,
            section: self.section,
            dtype: self.dtype,
            label: self.label,
            options,
            options_str: self.options_str,
            lower_bound,
            upper_bound,
        })
    }
}

fn parse_number(feature: &str, raw: &str) -> Result<f64, ConfigurationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ConfigurationError::InvalidOption {
            feature: feature.to_string(),
            raw: raw.to_string(),
        })
}

pub(crate) fn split_descriptions(options_str: &str) -> Vec<&str> {
    if options_str.trim().is_empty() {
        return Vec::new();
    }
    options_str.split('|').collect()
}

/// Split a description token into its category code and readable text.
/// `"2, Grade II"` yields `(Some("2"), "Grade II")`; `"Missing"` yields
/// `(None, "Missing")`.
pub(crate) fn split_token(token: &str) -> (Option<&str>, &str) {
    match token.split_once(',') {
        Some((code, text)) => (Some(code.trim()), text.trim()),
        None => (None, token.trim()),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
