//! Readers for the two-column `feature,number` tables (coefficients and
//! fallback averages). Header names vary between exports, so the header row is
//! discarded and the columns are taken positionally.

use super::error::{AssetLoadError, ConfigurationError};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TableRow {
    pub(crate) feature: String,
    pub(crate) value: f64,
}

pub(crate) fn read_table_file(
    path: &Path,
    table: &'static str,
) -> Result<Vec<TableRow>, AssetLoadError> {
    let file = std::fs::File::open(path).map_err(|source| AssetLoadError::io(path, source))?;
    read_table(file, path, table)
}

pub(crate) fn read_table<R: Read>(
    reader: R,
    origin: &Path,
    table: &'static str,
) -> Result<Vec<TableRow>, AssetLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for record in csv_reader.records() {
        let record = record.map_err(|source| AssetLoadError::csv(origin, source))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() != 2 {
            return Err(AssetLoadError::Malformed {
                path: origin.to_path_buf(),
                line,
                detail: format!("expected 2 columns, found {}", record.len()),
            });
        }

        let feature = normalize_feature(&record[0]);
        let value = record[1]
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| AssetLoadError::Malformed {
                path: origin.to_path_buf(),
                line,
                detail: format!("'{}' is not a number for {}", &record[1], feature),
            })?;

        if !seen.insert(feature.clone()) {
            return Err(ConfigurationError::DuplicateFeature { table, feature }.into());
        }

        rows.push(TableRow { feature, value });
    }

    Ok(rows)
}

/// Spreadsheet exports sometimes carry a byte-order mark on the first cell.
pub(crate) fn normalize_feature(raw: &str) -> String {
    raw.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn origin() -> &'static Path {
        Path::new("memory.csv")
    }

    #[test]
    fn discards_header_and_reads_pairs() {
        let csv = "Unnamed: 0,coef\nintercept,-1.25\nage , 0.02\n";
        let rows = read_table(Cursor::new(csv), origin(), "unstandardized").expect("table reads");
        assert_eq!(
            rows,
            vec![
                TableRow {
                    feature: "intercept".to_string(),
                    value: -1.25
                },
                TableRow {
                    feature: "age".to_string(),
                    value: 0.02
                },
            ]
        );
    }

    #[test]
    fn rejects_extra_columns() {
        let csv = "Feature,Coefficient\nage,0.02,extra\n";
        match read_table(Cursor::new(csv), origin(), "standardized") {
            Err(AssetLoadError::Malformed { line, detail, .. }) => {
                assert_eq!(line, 2);
                assert!(detail.contains("3"));
            }
            other => panic!("expected malformed row, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_values() {
        let csv = "Feature,Average\nage,abc\n";
        let error = read_table(Cursor::new(csv), origin(), "fallback").expect_err("bad number");
        assert!(error.to_string().contains("'abc' is not a number for age"));
    }

    #[test]
    fn rejects_duplicate_features() {
        let csv = "Feature,Coefficient\nage,0.1\nage,0.2\n";
        match read_table(Cursor::new(csv), origin(), "standardized") {
            Err(AssetLoadError::Configuration(ConfigurationError::DuplicateFeature {
                table,
                feature,
            })) => {
                assert_eq!(table, "standardized");
                assert_eq!(feature, "age");
            }
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn strips_byte_order_mark() {
        assert_eq!(normalize_feature("\u{feff}intercept "), "intercept");
    }

    #[test]
    fn missing_file_reports_path() {
        let error = read_table_file(Path::new("./no-such-table.csv"), "fallback")
            .expect_err("missing file");
        match error {
            AssetLoadError::Io { path, .. } => assert_eq!(path, Path::new("./no-such-table.csv")),
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
