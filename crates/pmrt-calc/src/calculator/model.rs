use super::error::{AssetLoadError, ConfigurationError};
use super::tables::{read_table, read_table_file, TableRow};
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

/// Name of the pseudo-feature carrying the model intercept.
pub const INTERCEPT: &str = "intercept";

/// One row of a coefficient table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientEntry {
    pub feature: String,
    pub coefficient: f64,
}

/// A fitted logistic model.
///
/// Scoring only ever reads the unstandardized coefficients. The standardized
/// ones are kept to rank features by influence for presentation.
#[derive(Debug, Clone)]
pub struct CoefficientModel {
    entries: Vec<CoefficientEntry>,
    standardized: HashMap<String, f64>,
    index: HashMap<String, usize>,
    /// Positions into `entries`, most influential first.
    ranking: Vec<usize>,
    ordered: Vec<String>,
    intercept: f64,
}

impl CoefficientModel {
    pub fn load(
        standardized_path: impl AsRef<Path>,
        unstandardized_path: impl AsRef<Path>,
    ) -> Result<Self, AssetLoadError> {
        let standardized = read_table_file(standardized_path.as_ref(), "standardized")?;
        let unstandardized = read_table_file(unstandardized_path.as_ref(), "unstandardized")?;
        Ok(Self::from_rows(standardized, unstandardized)?)
    }

    pub fn from_readers<S: Read, U: Read>(
        standardized: S,
        unstandardized: U,
    ) -> Result<Self, AssetLoadError> {
        let standardized = read_table(standardized, Path::new("<standardized>"), "standardized")?;
        let unstandardized =
            read_table(unstandardized, Path::new("<unstandardized>"), "unstandardized")?;
        Ok(Self::from_rows(standardized, unstandardized)?)
    }

    pub(crate) fn from_rows(
        standardized: Vec<TableRow>,
        unstandardized: Vec<TableRow>,
    ) -> Result<Self, ConfigurationError> {
        let standardized: HashMap<String, f64> = standardized
            .into_iter()
            .map(|row| (row.feature, row.value))
            .collect();

        let unstandardized_names: BTreeSet<&str> =
            unstandardized.iter().map(|row| row.feature.as_str()).collect();
        let standardized_names: BTreeSet<&str> =
            standardized.keys().map(String::as_str).collect();

        if standardized_names != unstandardized_names {
            return Err(ConfigurationError::FeatureSetMismatch {
                only_standardized: standardized_names
                    .difference(&unstandardized_names)
                    .map(|name| name.to_string())
                    .collect(),
                only_unstandardized: unstandardized_names
                    .difference(&standardized_names)
                    .map(|name| name.to_string())
                    .collect(),
            });
        }

        let intercept = unstandardized
            .iter()
            .find(|row| row.feature == INTERCEPT)
            .map(|row| row.value)
            .ok_or(ConfigurationError::MissingIntercept)?;

        let entries: Vec<CoefficientEntry> = unstandardized
            .into_iter()
            .map(|row| CoefficientEntry {
                feature: row.feature,
                coefficient: row.value,
            })
            .collect();

        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.feature.clone(), position))
            .collect();

        // Stable sort keeps table order among equally influential features.
        let mut ranking: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.feature != INTERCEPT)
            .map(|(position, _)| position)
            .collect();
        ranking.sort_by(|a, b| {
            let a = standardized[&entries[*a].feature].abs();
            let b = standardized[&entries[*b].feature].abs();
            b.total_cmp(&a)
        });
        let ordered = ranking
            .iter()
            .map(|position| entries[*position].feature.clone())
            .collect();

        Ok(Self {
            entries,
            standardized,
            index,
            ranking,
            ordered,
            intercept,
        })
    }

    /// Non-intercept features, most influential first.
    pub fn ordered_features(&self) -> &[String] {
        &self.ordered
    }

    /// Unstandardized entries in presentation order, intercept excluded.
    pub fn ordered_entries(&self) -> impl Iterator<Item = &CoefficientEntry> + '_ {
        self.ranking.iter().map(|position| &self.entries[*position])
    }

    pub fn coefficient_of(&self, feature: &str) -> Option<f64> {
        self.index
            .get(feature)
            .map(|position| self.entries[*position].coefficient)
    }

    pub fn standardized_coefficient_of(&self, feature: &str) -> Option<f64> {
        self.standardized.get(feature).copied()
    }

    pub fn intercept_value(&self) -> f64 {
        self.intercept
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.index.contains_key(feature)
    }

    /// Unstandardized entries in table order, intercept included.
    pub fn entries(&self) -> &[CoefficientEntry] {
        &self.entries
    }

    pub fn feature_count(&self) -> usize {
        self.ordered.len()
    }
}

/// Per-feature averages substituted for missing answers.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    averages: HashMap<String, f64>,
}

impl FallbackTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetLoadError> {
        let rows = read_table_file(path.as_ref(), "fallback")?;
        Ok(Self::from_rows(rows))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AssetLoadError> {
        let rows = read_table(reader, Path::new("<fallback>"), "fallback")?;
        Ok(Self::from_rows(rows))
    }

    fn from_rows(rows: Vec<TableRow>) -> Self {
        Self {
            averages: rows.into_iter().map(|row| (row.feature, row.value)).collect(),
        }
    }

    pub fn average(&self, feature: &str) -> Result<f64, ConfigurationError> {
        self.averages
            .get(feature)
            .copied()
            .ok_or_else(|| ConfigurationError::MissingFallback(feature.to_string()))
    }

    /// The value stored when an answer is missing.
    pub fn resolved(&self, feature: &str) -> Result<f64, ConfigurationError> {
        self.average(feature).map(|average| round_to_places(average, 5))
    }
}

impl FromIterator<(String, f64)> for FallbackTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            averages: iter.into_iter().collect(),
        }
    }
}

pub(crate) fn round_to_places(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const STANDARDIZED: &str = "feature,coef\nintercept,-0.4\nage,0.15\nnodes,-0.90\ngrade,0.15\n";
    const UNSTANDARDIZED: &str = "feature,coef\nintercept,-1.0\nage,0.02\nnodes,0.3\ngrade,0.5\n";

    fn model() -> CoefficientModel {
        CoefficientModel::from_readers(Cursor::new(STANDARDIZED), Cursor::new(UNSTANDARDIZED))
            .expect("model loads")
    }

    #[test]
    fn orders_by_standardized_magnitude() {
        let model = model();
        assert_eq!(model.ordered_features(), ["nodes", "age", "grade"]);
        assert_eq!(model.feature_count(), 3);
    }

    #[test]
    fn ordered_entries_pair_features_with_their_coefficients() {
        let model = model();
        let entries: Vec<(&str, f64)> = model
            .ordered_entries()
            .map(|entry| (entry.feature.as_str(), entry.coefficient))
            .collect();
        assert_eq!(entries, vec![("nodes", 0.3), ("age", 0.02), ("grade", 0.5)]);
    }

    #[test]
    fn scores_with_unstandardized_coefficients() {
        let model = model();
        assert_eq!(model.coefficient_of("nodes"), Some(0.3));
        assert_eq!(model.standardized_coefficient_of("nodes"), Some(-0.9));
        assert_eq!(model.intercept_value(), -1.0);
        assert_eq!(model.coefficient_of("unknown"), None);
    }

    #[test]
    fn mismatch_names_exactly_the_differing_features() {
        let standardized = "f,c\nintercept,0.1\nage,0.2\nsize,0.3\n";
        let unstandardized = "f,c\nintercept,0.1\nage,0.2\nnodes,0.4\nlvi,0.5\n";
        let error = CoefficientModel::from_readers(
            Cursor::new(standardized),
            Cursor::new(unstandardized),
        )
        .expect_err("mismatch rejected");

        match error {
            AssetLoadError::Configuration(ConfigurationError::FeatureSetMismatch {
                only_standardized,
                only_unstandardized,
            }) => {
                assert_eq!(only_standardized, vec!["size".to_string()]);
                assert_eq!(
                    only_unstandardized,
                    vec!["lvi".to_string(), "nodes".to_string()]
                );
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn requires_intercept() {
        let table = "f,c\nage,0.2\n";
        let error = CoefficientModel::from_readers(Cursor::new(table), Cursor::new(table))
            .expect_err("no intercept");
        assert!(matches!(
            error,
            AssetLoadError::Configuration(ConfigurationError::MissingIntercept)
        ));
    }

    #[test]
    fn fallback_resolution_rounds_to_five_places() {
        let fallbacks =
            FallbackTable::from_reader(Cursor::new("Feature,Average\nage,54.1234567\n"))
                .expect("fallbacks load");
        assert_eq!(fallbacks.average("age"), Ok(54.1234567));
        assert_eq!(fallbacks.resolved("age"), Ok(54.12346));
        assert_eq!(
            fallbacks.resolved("nodes"),
            Err(ConfigurationError::MissingFallback("nodes".to_string()))
        );
    }
}
