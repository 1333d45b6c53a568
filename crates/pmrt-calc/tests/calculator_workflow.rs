use pmrt_calc::calculator::{
    CalculationReport, CalculatorAssets, CalculatorError, ConfigurationError, DataLayout,
    FormVariant, InterceptDisplay, SentinelMode, ValueSource, Widget,
};
use pmrt_calc::config::{parse_fixed_values, parse_sentinel_mode};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(model: &str) -> CalculatorAssets {
    CalculatorAssets::load(&DataLayout::new(fixture_dir()), model).expect("fixture model loads")
}

fn inputs_file() -> BTreeMap<String, f64> {
    let raw = std::fs::read_to_string(fixture_dir().join("inputs.json")).expect("inputs readable");
    serde_json::from_str(&raw).expect("inputs parse")
}

#[test]
fn scores_a_saved_submission_end_to_end() {
    let assets = load("Logistic Lasso");
    let variant = FormVariant::default();

    let calculation = assets
        .calculate(&variant, &inputs_file())
        .expect("submission scores");
    let report = CalculationReport::build(&assets, &variant, &calculation).expect("report builds");

    assert!((calculation.result.raw_score + 1.4).abs() < 1e-9);
    assert!((calculation.result.rounded_probability - 0.2).abs() < 1e-9);
    let text = report.render_text();
    assert!(text.starts_with("Probability of PMRT: 19.782%\n"), "{text}");
    assert!(text.contains("- grade: 2 (Grade II)"));
    assert!(text.contains("+ 0.50000 * 1 (lvi)"));
    assert!(text.contains("= -1.40000"));
}

#[test]
fn unanswered_form_scores_at_the_averages() {
    let assets = load("Elastic Net");
    let variant = FormVariant::default();

    let calculation = assets
        .calculate(&variant, &BTreeMap::new())
        .expect("empty submission scores");

    let submission = &calculation.submission;
    assert_eq!(submission.get("age"), Some(54.12346));
    assert_eq!(submission.get("nodes"), Some(2.4));
    assert_eq!(
        submission.resolved("age").map(|resolved| resolved.source),
        Some(ValueSource::Fallback)
    );
    let expected = -1.5 + 0.12 * 2.4 - 0.01 * 54.12346;
    assert!((calculation.result.raw_score - expected).abs() < 1e-9);
}

#[test]
fn deployment_variant_pins_features_and_starts_at_averages() {
    let assets = load("Logistic Lasso");
    let variant = FormVariant {
        fixed_values: parse_fixed_values("lvi=1, histology=2").expect("fixed values parse"),
        sentinel_mode: parse_sentinel_mode("fallback").expect("mode parses"),
        intercept_display: InterceptDisplay::Hidden,
        ..FormVariant::default()
    };
    assert_eq!(variant.sentinel_mode, SentinelMode::Fallback);

    let engine = assets.form(&variant).expect("engine builds");
    let fields = engine.fields().expect("fields build");
    let features: Vec<&str> = fields.iter().map(|field| field.feature.as_str()).collect();
    assert_eq!(features, ["nodes", "age", "grade"]);
    match &fields[1].widget {
        Widget::Real(spec) => assert_eq!(spec.initial, 54.12346),
        other => panic!("expected a real slider, got {other:?}"),
    }

    let calculation = assets
        .calculate(&variant, &inputs_file())
        .expect("submission scores");
    assert_eq!(calculation.submission.get("histology"), Some(2.0));
    let report = CalculationReport::build(&assets, &variant, &calculation).expect("report builds");
    assert_eq!(report.intercept, None);
}

#[test]
fn fixed_values_for_other_models_are_rejected() {
    let assets = load("Elastic Net");
    let variant = FormVariant {
        fixed_values: parse_fixed_values("grade=2").expect("fixed values parse"),
        ..FormVariant::default()
    };

    match assets.calculate(&variant, &BTreeMap::new()) {
        Err(CalculatorError::Configuration(ConfigurationError::UnknownFixedFeature(feature))) => {
            assert_eq!(feature, "grade")
        }
        other => panic!("expected an unknown fixed feature, got {other:?}"),
    }
}
