pub mod views;

use super::assets::{CalculatorAssets, Calculation};
use super::error::ConfigurationError;
use super::form::{FormVariant, InterceptDisplay};
use serde::Serialize;
use std::fmt::Write as _;
use views::{CalculationTermView, EnteredValueView};

/// Everything the result panel shows for one scored submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationReport {
    pub model: String,
    pub outcome_label: String,
    pub feature_count: usize,
    pub probability: f64,
    pub rounded_probability: f64,
    pub rounding_base: f64,
    pub raw_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intercept: Option<f64>,
    pub entries: Vec<EnteredValueView>,
    pub terms: Vec<CalculationTermView>,
}

impl CalculationReport {
    pub fn build(
        assets: &CalculatorAssets,
        variant: &FormVariant,
        calculation: &Calculation,
    ) -> Result<Self, ConfigurationError> {
        let Calculation { submission, result } = calculation;

        let mut entries = Vec::with_capacity(result.contributions.len());
        for term in &result.contributions {
            let resolved = submission
                .resolved(&term.feature)
                .ok_or_else(|| ConfigurationError::IncompleteSubmission(term.feature.clone()))?;
            // Summary view: the sentinel has already been replaced.
            let descriptor = assets.catalog.lookup(&term.feature, false)?;
            entries.push(EnteredValueView {
                feature: term.feature.clone(),
                description: descriptor.description_of(resolved.value),
                section: descriptor.section,
                label: descriptor.label,
                value: resolved.value,
                source: resolved.source,
            });
        }

        let terms = result
            .contributions
            .iter()
            .map(|term| CalculationTermView {
                feature: term.feature.clone(),
                coefficient: term.coefficient,
                value: term.value,
                contribution: term.contribution,
            })
            .collect();

        Ok(Self {
            model: assets.name.clone(),
            outcome_label: variant.outcome_label.clone(),
            feature_count: assets.model.feature_count(),
            probability: result.probability,
            rounded_probability: result.rounded_probability,
            rounding_base: result.rounding_base,
            raw_score: result.raw_score,
            intercept: match variant.intercept_display {
                InterceptDisplay::Shown => Some(result.intercept),
                InterceptDisplay::Hidden => None,
            },
            entries,
            terms,
        })
    }

    pub fn headline(&self) -> String {
        format!(
            "Probability of {}: {:.3}%",
            self.outcome_label,
            self.probability * 100.0
        )
    }

    /// The calculation as printed lines, ending with the logistic step.
    pub fn calculation_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.terms.len() + 3);
        if let Some(intercept) = self.intercept {
            lines.push(format!("{intercept:.3} (intercept)"));
        }
        lines.extend(self.terms.iter().map(CalculationTermView::line));
        lines.push(format!("= {:.5}", self.raw_score));
        lines.push(format!(
            "Probability = 1 / (1 + exp(- ({:.5}))) = {:.5}",
            self.raw_score, self.probability
        ));
        lines
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        writeln!(&mut out, "{}", self.headline()).expect("write headline");
        writeln!(
            &mut out,
            "Rounded to the nearest {:.1}%: {:.1}%",
            self.rounding_base * 100.0,
            self.rounded_probability * 100.0
        )
        .expect("write rounding");
        writeln!(
            &mut out,
            "Model: {}, {} input features.",
            self.model, self.feature_count
        )
        .expect("write model");

        writeln!(&mut out, "\nValues entered:").expect("write values heading");
        for entry in &self.entries {
            let written = match entry.note() {
                Some(note) => writeln!(&mut out, "- {}: {} ({})", entry.feature, entry.value, note),
                None => writeln!(&mut out, "- {}: {}", entry.feature, entry.value),
            };
            written.expect("write value");
        }

        writeln!(&mut out, "\nCalculation (coefficient * value):")
            .expect("write calculation heading");
        for line in self.calculation_lines() {
            writeln!(&mut out, "{line}").expect("write calculation");
        }
        out
    }
}
