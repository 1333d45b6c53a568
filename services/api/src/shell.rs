//! Interactive terminal rendering of the calculator form.

use pmrt_calc::calculator::{
    CalculationReport, CalculatorAssets, FormField, FormVariant, OptionChoice, SliderSpec,
    WidgetProvider, MISSING_SENTINEL,
};
use pmrt_calc::error::AppError;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Line-oriented widgets over any reader/writer pair. Invalid answers are
/// re-asked. An empty line picks the first choice, or answers "unknown" on a
/// numeric control so the form substitutes the fallback average. End of input
/// abandons the session.
pub(crate) struct TerminalWidgets<R, W> {
    input: R,
    output: W,
    section: Option<String>,
}

impl<R: BufRead, W: Write> TerminalWidgets<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            section: None,
        }
    }

    pub(crate) fn output(&mut self) -> &mut W {
        &mut self.output
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before the form was submitted",
            ));
        }
        Ok(line.trim().to_string())
    }

    fn heading(&mut self, field: &FormField) -> io::Result<()> {
        if field.section.is_empty() || self.section.as_deref() == Some(field.section.as_str()) {
            return Ok(());
        }
        writeln!(self.output, "\n== {} ==", field.section)?;
        self.section = Some(field.section.clone());
        Ok(())
    }

    /// Ask until `accept` takes the parsed answer. An empty line returns
    /// `blank` as is.
    fn ask<T, F>(&mut self, prompt: &str, hint: &str, blank: T, accept: F) -> io::Result<T>
    where
        T: FromStr + Copy,
        F: Fn(T) -> Result<(), String>,
    {
        loop {
            write!(self.output, "{prompt} [{hint}]: ")?;
            let line = self.read_line()?;
            if line.is_empty() {
                return Ok(blank);
            }
            let answer = match line.parse::<T>() {
                Ok(answer) => answer,
                Err(_) => {
                    writeln!(self.output, "  '{line}' is not a number.")?;
                    continue;
                }
            };
            match accept(answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => writeln!(self.output, "  {reason}")?,
            }
        }
    }

    fn choose(&mut self, field: &FormField, choices: &[OptionChoice]) -> io::Result<f64> {
        self.heading(field)?;
        writeln!(self.output, "{}", field.prompt())?;
        for choice in choices {
            writeln!(self.output, "  [{}] {}", choice.value, choice.description)?;
        }
        let initial = choices
            .first()
            .map(|choice| choice.value)
            .unwrap_or(MISSING_SENTINEL);
        self.ask("Choice", &initial.to_string(), initial, |value: f64| {
            if choices.iter().any(|choice| choice.value == value) {
                Ok(())
            } else {
                Err("Please pick one of the listed values.".to_string())
            }
        })
    }

    /// Numeric control; `unknown` is the sentinel in the control's type.
    fn slider<T>(&mut self, field: &FormField, spec: &SliderSpec, unknown: T) -> io::Result<T>
    where
        T: FromStr + Copy + std::fmt::Display + Into<f64>,
    {
        self.heading(field)?;
        let range = if spec.allows_missing {
            format!("{} to {}, {} if unknown", spec.lower, spec.upper, MISSING_SENTINEL)
        } else {
            format!("{} to {}", spec.lower, spec.upper)
        };
        let prompt = format!("{} ({range})", field.prompt());
        let hint = if spec.allows_missing {
            unknown.to_string()
        } else {
            format!("average {}", field.fallback)
        };
        self.ask(&prompt, &hint, unknown, |value: T| {
            let value: f64 = value.into();
            if spec.contains(value) || (spec.allows_missing && value == MISSING_SENTINEL) {
                Ok(())
            } else {
                Err(format!(
                    "Please enter a value between {} and {}.",
                    spec.lower, spec.upper
                ))
            }
        })
    }

    /// Yes/no question; an empty answer takes `default`.
    pub(crate) fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            write!(self.output, "{question} [{hint}]: ")?;
            let line = self.read_line()?;
            match line.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" | "1" => return Ok(true),
                "n" | "no" | "0" => return Ok(false),
                _ => writeln!(self.output, "  Please answer y or n.")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> WidgetProvider for TerminalWidgets<R, W> {
    type Error = io::Error;

    fn categorical(&mut self, field: &FormField, choices: &[OptionChoice]) -> io::Result<f64> {
        self.choose(field, choices)
    }

    fn ordinal(&mut self, field: &FormField, choices: &[OptionChoice]) -> io::Result<f64> {
        self.choose(field, choices)
    }

    fn checkbox(&mut self, field: &FormField) -> io::Result<bool> {
        self.heading(field)?;
        self.confirm(&field.prompt(), false)
    }

    fn real(&mut self, field: &FormField, spec: &SliderSpec) -> io::Result<f64> {
        self.slider(field, spec, MISSING_SENTINEL)
    }

    fn integer(&mut self, field: &FormField, spec: &SliderSpec) -> io::Result<i64> {
        self.slider(field, spec, MISSING_SENTINEL as i32).map(i64::from)
    }
}

/// Walk the form on a terminal, then score after explicit confirmation.
/// Returns `None` when the user declines.
pub(crate) fn run_session<R: BufRead, W: Write>(
    assets: &CalculatorAssets,
    variant: &FormVariant,
    input: R,
    output: W,
) -> Result<Option<CalculationReport>, AppError> {
    let engine = assets.form(variant)?;
    let mut widgets = TerminalWidgets::new(input, output);

    writeln!(
        widgets.output(),
        "{} calculator ({})",
        variant.outcome_label,
        assets.name
    )?;
    if let Some(intercept) = engine.intercept_row() {
        writeln!(widgets.output(), "Intercept: {intercept:.3}")?;
    }

    let submission = engine.render(&mut widgets)?;

    if !widgets.confirm("\nCompute probability?", true)? {
        writeln!(widgets.output(), "Submission discarded.")?;
        return Ok(None);
    }

    let calculation = assets.score(variant, submission)?;
    let report = CalculationReport::build(assets, variant, &calculation)?;
    writeln!(widgets.output(), "\n{}", report.render_text())?;
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::fixture_registry_for_tests;
    use pmrt_calc::calculator::{CalculatorError, SentinelMode, ValueSource};
    use std::io::Cursor;

    fn session(script: &str) -> (Result<Option<CalculationReport>, AppError>, String) {
        session_with(&FormVariant::default(), script)
    }

    fn session_with(
        variant: &FormVariant,
        script: &str,
    ) -> (Result<Option<CalculationReport>, AppError>, String) {
        let registry = fixture_registry_for_tests();
        let assets = registry.get("Logistic Lasso").expect("fixture model");
        let mut output = Vec::new();
        let outcome = run_session(
            &assets,
            variant,
            Cursor::new(script.to_string()),
            &mut output,
        );
        (outcome, String::from_utf8(output).expect("utf8 output"))
    }

    #[test]
    fn scores_answers_after_confirmation() {
        let (outcome, output) = session("3\n60\n2\n1\ny\n\n");

        let report = outcome.expect("session completes").expect("report");
        assert_eq!(report.headline(), "Probability of PMRT: 19.782%");
        assert!(output.contains("Intercept: -2.000"));
        assert!(output.contains("== Pathology =="));
        assert!(output.contains("+ 0.15000 * 3 (nodes)"));
    }

    #[test]
    fn empty_answers_fall_back_to_averages() {
        let (outcome, output) = session("\n\n\n\n\n\n");

        let report = outcome.expect("session completes").expect("report");
        let age = report
            .entries
            .iter()
            .find(|entry| entry.feature == "age")
            .expect("age entry");
        assert_eq!(age.source, ValueSource::Fallback);
        assert_eq!(age.value, 54.12346);
        assert!(output.contains("missing value, using the average"));
    }

    #[test]
    fn untouched_integers_use_the_unrounded_average() {
        let variant = FormVariant {
            sentinel_mode: SentinelMode::Fallback,
            ..FormVariant::default()
        };

        let (outcome, output) = session_with(&variant, "\n\n\n\n\n\n");

        let report = outcome.expect("session completes").expect("report");
        let nodes = report
            .entries
            .iter()
            .find(|entry| entry.feature == "nodes")
            .expect("nodes entry");
        assert_eq!(nodes.source, ValueSource::Fallback);
        assert_eq!(nodes.value, 2.4);
        assert!(output.contains("[average 2.4]"));

        let registry = fixture_registry_for_tests();
        let assets = registry.get("Logistic Lasso").expect("fixture model");
        let over_http = assets
            .calculate(&variant, &Default::default())
            .expect("empty inputs resolve");
        let resolved = over_http.submission.resolved("nodes").expect("nodes resolved");
        assert_eq!((resolved.value, resolved.source), (nodes.value, nodes.source));
    }

    #[test]
    fn invalid_answers_are_asked_again() {
        let (outcome, output) = session("99\nmany\n3\n60\n7\n2\n1\nmaybe\ny\n\n");

        let report = outcome.expect("session completes").expect("report");
        assert!(output.contains("Please enter a value between 0 and 40."));
        assert!(output.contains("'many' is not a number."));
        assert!(output.contains("Please pick one of the listed values."));
        assert!(output.contains("Please answer y or n."));
        assert_eq!(report.entries[0].value, 3.0);
    }

    #[test]
    fn declining_discards_the_submission() {
        let (outcome, output) = session("3\n60\n2\n1\ny\nn\n");

        assert!(outcome.expect("session completes").is_none());
        assert!(output.contains("Submission discarded."));
        assert!(!output.contains("Probability of"));
    }

    #[test]
    fn closed_input_abandons_the_session() {
        let (outcome, _) = session("3\n60\n");

        match outcome {
            Err(AppError::Calculator(CalculatorError::Io(error))) => {
                assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof)
            }
            other => panic!("expected an abandoned session, got {other:?}"),
        }
    }
}
