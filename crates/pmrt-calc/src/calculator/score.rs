use super::error::ConfigurationError;
use super::form::FormSubmission;
use super::model::CoefficientModel;
use serde::Serialize;

pub const DEFAULT_ROUNDING_BASE: f64 = 0.1;

/// One term of the weighted sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub feature: String,
    pub coefficient: f64,
    pub value: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Intercept plus the weighted sum of resolved values.
    pub raw_score: f64,
    pub probability: f64,
    pub rounded_probability: f64,
    pub rounding_base: f64,
    pub intercept: f64,
    /// Terms in the model's presentation order.
    pub contributions: Vec<Contribution>,
}

/// Stateless scorer. Same model and submission, same result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreEngine {
    rounding_base: f64,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self {
            rounding_base: DEFAULT_ROUNDING_BASE,
        }
    }
}

impl ScoreEngine {
    pub fn new(rounding_base: f64) -> Result<Self, ConfigurationError> {
        if !rounding_base.is_finite() || rounding_base <= 0.0 {
            return Err(ConfigurationError::InvalidRoundingBase(rounding_base));
        }
        Ok(Self { rounding_base })
    }

    pub fn rounding_base(&self) -> f64 {
        self.rounding_base
    }

    pub fn score(
        &self,
        model: &CoefficientModel,
        submission: &FormSubmission,
    ) -> Result<ScoreResult, ConfigurationError> {
        let intercept = model.intercept_value();
        let mut raw_score = intercept;
        let mut contributions = Vec::with_capacity(model.feature_count());

        for entry in model.ordered_entries() {
            let value = submission
                .get(&entry.feature)
                .ok_or_else(|| ConfigurationError::IncompleteSubmission(entry.feature.clone()))?;
            let contribution = entry.coefficient * value;
            raw_score += contribution;
            contributions.push(Contribution {
                feature: entry.feature.clone(),
                coefficient: entry.coefficient,
                value,
                contribution,
            });
        }

        let probability = logistic(raw_score);

        Ok(ScoreResult {
            raw_score,
            probability,
            rounded_probability: round_to_base(probability, self.rounding_base),
            rounding_base: self.rounding_base,
            intercept,
            contributions,
        })
    }
}

/// `1 / (1 + e^-x)`, branching on the sign so `exp` never overflows.
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Nearest multiple of `base`; exact halves round away from zero.
///
/// Decimal bases come out as the nearest literal (`0.3`, not
/// `0.30000000000000004`).
pub fn round_to_base(value: f64, base: f64) -> f64 {
    (value / base).round() / base.recip()
}
