use metrics_exporter_prometheus::PrometheusHandle;
use pmrt_calc::calculator::{AssetRegistry, DataLayout, FormVariant};
use pmrt_calc::error::AppError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) registry: Arc<AssetRegistry>,
    pub(crate) variant: Arc<FormVariant>,
    pub(crate) default_model: Arc<str>,
}

/// Load every model pair found under `data_dir`.
pub(crate) fn load_registry(data_dir: &Path) -> Result<AssetRegistry, AppError> {
    let layout = DataLayout::new(data_dir);
    let registry = AssetRegistry::load_all(&layout)?;
    info!(
        data_dir = %data_dir.display(),
        models = registry.names().count(),
        "model registry loaded"
    );
    Ok(registry)
}

/// Read a `{ "feature": number }` JSON object from disk.
pub(crate) fn read_inputs(path: &Path) -> Result<BTreeMap<String, f64>, AppError> {
    let file = std::fs::File::open(path)?;
    let inputs = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(std::io::Error::from)?;
    Ok(inputs)
}

#[cfg(test)]
pub(crate) fn fixture_dir_for_tests() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../crates/pmrt-calc/tests/fixtures")
}

#[cfg(test)]
pub(crate) fn fixture_registry_for_tests() -> AssetRegistry {
    load_registry(&fixture_dir_for_tests()).expect("fixture tables load")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_directory_offers_both_models() {
        let registry = fixture_registry_for_tests();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["Elastic Net", "Logistic Lasso"]);
    }

    #[test]
    fn reads_inputs_from_json() {
        let path = fixture_dir_for_tests().join("inputs.json");
        let inputs = read_inputs(&path).expect("inputs parse");
        assert_eq!(inputs.get("age"), Some(&60.0));
        assert_eq!(inputs.len(), 5);
    }

    #[test]
    fn malformed_inputs_are_io_errors() {
        let path = fixture_dir_for_tests().join("Metadata.csv");
        match read_inputs(&path) {
            Err(AppError::Io(error)) => {
                assert_eq!(error.kind(), std::io::ErrorKind::InvalidData)
            }
            other => panic!("expected an io error, got {other:?}"),
        }
    }
}
