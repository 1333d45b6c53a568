use super::catalog::MetadataCatalog;
use super::error::{AssetLoadError, CalculatorError, ConfigurationError};
use super::form::{FormEngine, FormSubmission, FormVariant};
use super::model::{CoefficientModel, FallbackTable};
use super::score::{ScoreEngine, ScoreResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const STANDARDIZED_PREFIX: &str = "standardized_coef_";
const UNSTANDARDIZED_PREFIX: &str = "unstandardized_coef_";
const METADATA_FILE: &str = "Metadata.csv";
const FALLBACK_FILE: &str = "col_to_avg.csv";

/// File naming inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn standardized_path(&self, model: &str) -> PathBuf {
        self.root.join(format!("{STANDARDIZED_PREFIX}{model}.csv"))
    }

    pub fn unstandardized_path(&self, model: &str) -> PathBuf {
        self.root.join(format!("{UNSTANDARDIZED_PREFIX}{model}.csv"))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.root.join(FALLBACK_FILE)
    }

    /// Model names that have both coefficient tables, sorted.
    pub fn available_models(&self) -> Result<Vec<String>, AssetLoadError> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|source| AssetLoadError::io(&self.root, source))?;

        let mut models = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| AssetLoadError::io(&self.root, source))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(model) = name
                .strip_prefix(STANDARDIZED_PREFIX)
                .and_then(|rest| rest.strip_suffix(".csv"))
            else {
                continue;
            };
            if self.unstandardized_path(model).is_file() {
                models.insert(model.to_string());
            }
        }

        Ok(models.into_iter().collect())
    }
}

/// Everything needed to build the form and score it for one fitted model.
/// Immutable once loaded and safe to share between sessions.
#[derive(Debug, Clone)]
pub struct CalculatorAssets {
    pub name: String,
    pub model: CoefficientModel,
    pub catalog: MetadataCatalog,
    pub fallbacks: FallbackTable,
}

/// Resolved answers and their score.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub submission: FormSubmission,
    pub result: ScoreResult,
}

impl CalculatorAssets {
    pub fn load(layout: &DataLayout, model: &str) -> Result<Self, AssetLoadError> {
        let coefficients = CoefficientModel::load(
            layout.standardized_path(model),
            layout.unstandardized_path(model),
        )?;
        let catalog = MetadataCatalog::load(layout.metadata_path())?;
        let fallbacks = FallbackTable::load(layout.fallback_path())?;

        let assets = Self::new(model, coefficients, catalog, fallbacks)?;
        info!(
            model = %assets.name,
            features = assets.model.feature_count(),
            "model tables loaded"
        );
        Ok(assets)
    }

    /// Bundle already-parsed tables, checking that every model feature has
    /// metadata and a fallback average.
    pub fn new(
        name: impl Into<String>,
        model: CoefficientModel,
        catalog: MetadataCatalog,
        fallbacks: FallbackTable,
    ) -> Result<Self, ConfigurationError> {
        let assets = Self {
            name: name.into(),
            model,
            catalog,
            fallbacks,
        };
        assets.validate()?;
        Ok(assets)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        for feature in self.model.ordered_features() {
            let checked = self
                .catalog
                .lookup(feature, true)
                .and_then(|descriptor| descriptor.kind())
                .and_then(|_| self.fallbacks.average(feature));
            if let Err(error) = checked {
                warn!(model = %self.name, %error, "model tables are inconsistent");
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn form<'a>(
        &'a self,
        variant: &'a FormVariant,
    ) -> Result<FormEngine<'a>, ConfigurationError> {
        FormEngine::new(&self.model, &self.catalog, &self.fallbacks, variant)
    }

    /// Resolve raw answers and score them in one step.
    pub fn calculate(
        &self,
        variant: &FormVariant,
        raw_inputs: &BTreeMap<String, f64>,
    ) -> Result<Calculation, CalculatorError> {
        let submission = self.form(variant)?.resolve(raw_inputs)?;
        self.score(variant, submission)
    }

    pub fn score(
        &self,
        variant: &FormVariant,
        submission: FormSubmission,
    ) -> Result<Calculation, CalculatorError> {
        let result = ScoreEngine::new(variant.rounding_base)?.score(&self.model, &submission)?;
        tracing::debug!(
            model = %self.name,
            rounded_probability = result.rounded_probability,
            "submission scored"
        );
        Ok(Calculation { submission, result })
    }
}

/// All models found in a data directory, loaded up front.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    models: BTreeMap<String, Arc<CalculatorAssets>>,
}

impl AssetRegistry {
    pub fn load_all(layout: &DataLayout) -> Result<Self, AssetLoadError> {
        let mut models = BTreeMap::new();
        for name in layout.available_models()? {
            let assets = CalculatorAssets::load(layout, &name)?;
            models.insert(name, Arc::new(assets));
        }
        Ok(Self { models })
    }

    pub fn insert(&mut self, assets: CalculatorAssets) {
        self.models.insert(assets.name.clone(), Arc::new(assets));
    }

    pub fn get(&self, model: &str) -> Result<Arc<CalculatorAssets>, CalculatorError> {
        self.models
            .get(model)
            .cloned()
            .ok_or_else(|| CalculatorError::UnknownModel(model.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
