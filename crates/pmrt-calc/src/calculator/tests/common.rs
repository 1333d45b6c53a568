use std::collections::BTreeMap;
use std::io;

use crate::calculator::{
    CalculatorAssets, CoefficientModel, FallbackTable, FormField, FormVariant, MetadataCatalog,
    OptionChoice, SliderSpec, WidgetProvider, MISSING_SENTINEL,
};

pub(super) const STANDARDIZED: &str = "\
feature,coefficient
intercept,0.0
age,-0.9
grade,0.6
histology,0.4
lvi,0.2
nodes,1.2
";

pub(super) const UNSTANDARDIZED: &str = "\
feature,coefficient
intercept,-2.0
age,-0.02
grade,0.3
histology,0.25
lvi,0.5
nodes,0.15
";

pub(super) const METADATA: &str = "\
name,section,dtype,label,options,options_str,lower_bound,upper_bound
age,Patient,real,Age at diagnosis,,,18,90
nodes,Pathology,integer,Positive lymph nodes,,,0,40
grade,Pathology,ordinal,Histologic grade,-1|1|2|3,\"-1, Unknown|1, Grade I|2, Grade II|3, Grade III\",,
histology,Pathology,categorical,Histologic type,1|2|-1,\"1, Ductal|2, Lobular|-1, Unknown\",,
lvi,Pathology,Checkbox,Lymphovascular invasion,,,,
";

pub(super) const FALLBACKS: &str = "\
feature,average
age,54.1234567
grade,1.8
histology,1.2
lvi,0.3
nodes,2.4
";

pub(super) fn model() -> CoefficientModel {
    CoefficientModel::from_readers(STANDARDIZED.as_bytes(), UNSTANDARDIZED.as_bytes())
        .expect("fixture coefficients parse")
}

pub(super) fn catalog() -> MetadataCatalog {
    MetadataCatalog::from_reader(METADATA.as_bytes()).expect("fixture metadata parses")
}

pub(super) fn catalog_from(metadata: &str) -> MetadataCatalog {
    MetadataCatalog::from_reader(metadata.as_bytes()).expect("metadata parses")
}

pub(super) fn fallbacks() -> FallbackTable {
    FallbackTable::from_reader(FALLBACKS.as_bytes()).expect("fixture fallbacks parse")
}

pub(super) fn assets() -> CalculatorAssets {
    CalculatorAssets::new("Logistic Lasso", model(), catalog(), fallbacks())
        .expect("fixture tables agree")
}

pub(super) fn variant() -> FormVariant {
    FormVariant::default()
}

pub(super) fn raw(values: &[(&str, f64)]) -> BTreeMap<String, f64> {
    values
        .iter()
        .map(|(feature, value)| (feature.to_string(), *value))
        .collect()
}

/// Every feature answered explicitly; scores to `-1.4`.
pub(super) fn complete_inputs() -> BTreeMap<String, f64> {
    raw(&[
        ("nodes", 3.0),
        ("age", 60.0),
        ("grade", 2.0),
        ("histology", 1.0),
        ("lvi", 1.0),
    ])
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Provider that answers from a script and records what it was asked.
#[derive(Default)]
pub(super) struct ScriptedWidgets {
    answers: BTreeMap<String, f64>,
    pub(super) asked: Vec<(String, &'static str)>,
    pub(super) sliders: BTreeMap<String, SliderSpec>,
}

impl ScriptedWidgets {
    pub(super) fn answering(values: &[(&str, f64)]) -> Self {
        Self {
            answers: raw(values),
            ..Self::default()
        }
    }

    fn answer(&mut self, field: &FormField) -> f64 {
        self.asked
            .push((field.feature.clone(), field.widget.dtype().label()));
        self.answers
            .get(&field.feature)
            .copied()
            .unwrap_or(MISSING_SENTINEL)
    }
}

impl WidgetProvider for ScriptedWidgets {
    type Error = io::Error;

    fn categorical(&mut self, field: &FormField, _choices: &[OptionChoice]) -> io::Result<f64> {
        Ok(self.answer(field))
    }

    fn ordinal(&mut self, field: &FormField, _choices: &[OptionChoice]) -> io::Result<f64> {
        Ok(self.answer(field))
    }

    fn checkbox(&mut self, field: &FormField) -> io::Result<bool> {
        Ok(self.answer(field) == 1.0)
    }

    fn real(&mut self, field: &FormField, spec: &SliderSpec) -> io::Result<f64> {
        self.sliders.insert(field.feature.clone(), spec.clone());
        Ok(self.answer(field))
    }

    fn integer(&mut self, field: &FormField, spec: &SliderSpec) -> io::Result<i64> {
        self.sliders.insert(field.feature.clone(), spec.clone());
        Ok(self.answer(field) as i64)
    }
}

/// Provider whose input stream has gone away.
pub(super) struct ClosedInput;

impl WidgetProvider for ClosedInput {
    type Error = io::Error;

    fn categorical(&mut self, _field: &FormField, _choices: &[OptionChoice]) -> io::Result<f64> {
        Err(io::ErrorKind::UnexpectedEof.into())
    }

    fn ordinal(&mut self, _field: &FormField, _choices: &[OptionChoice]) -> io::Result<f64> {
        Err(io::ErrorKind::UnexpectedEof.into())
    }

    fn checkbox(&mut self, _field: &FormField) -> io::Result<bool> {
        Err(io::ErrorKind::UnexpectedEof.into())
    }

    fn real(&mut self, _field: &FormField, _spec: &SliderSpec) -> io::Result<f64> {
        Err(io::ErrorKind::UnexpectedEof.into())
    }

    fn integer(&mut self, _field: &FormField, _spec: &SliderSpec) -> io::Result<i64> {
        Err(io::ErrorKind::UnexpectedEof.into())
    }
}
