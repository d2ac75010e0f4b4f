//! CSV ingest and validation.
//!
//! This module turns a numeric CSV table into the feature columns, target and
//! optional weights that the regressors consume.
//!
//! Design goals:
//! - **Strict schema** for selected columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior**: column order follows the header/CLI order
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use log::{info, warn};
use nalgebra::DVector;

use crate::domain::FitConfig;
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Selected numeric columns of a CSV file (only rows where all parse).
#[derive(Debug, Clone)]
pub struct NumericTable {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl NumericTable {
    pub fn rows_used(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, name: &str) -> Option<DVector<f64>> {
        let name = normalize_header_name(name);
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|j| DVector::from_column_slice(&self.columns[j]))
    }
}

/// Ingest output: feature columns + target (+ weights) + bookkeeping.
#[derive(Debug, Clone)]
pub struct IngestedData {
    /// Raw input column names, in design order.
    pub inputs: Vec<String>,
    pub features: Vec<DVector<f64>>,
    pub target: DVector<f64>,
    pub weights: Option<DVector<f64>>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load the target, feature and weight columns named by `config`.
///
/// When `config.features` is `None`, every column except the target and the
/// weight column is used as a feature.
pub fn load_fit_data(config: &FitConfig) -> Result<IngestedData, AppError> {
    let headers = read_headers(&config.csv_path)?;
    let target = normalize_header_name(&config.target);
    let weights_column = config.weights_column.as_deref().map(normalize_header_name);

    let inputs: Vec<String> = match &config.features {
        Some(names) => names.iter().map(|n| normalize_header_name(n)).collect(),
        None => headers
            .iter()
            .filter(|h| **h != target && Some(*h) != weights_column.as_ref())
            .cloned()
            .collect(),
    };
    if inputs.is_empty() {
        return Err(AppError::new(2, "No feature columns selected."));
    }
    if inputs.contains(&target) {
        return Err(AppError::new(
            2,
            format!("Target column `{target}` cannot also be a feature."),
        ));
    }

    let mut wanted = inputs.clone();
    wanted.push(target.clone());
    if let Some(w) = &weights_column {
        wanted.push(w.clone());
    }

    let table = read_numeric_table(&config.csv_path, &wanted)?;
    let rows_used = table.rows_used();

    let features: Vec<DVector<f64>> = inputs
        .iter()
        .filter_map(|name| table.column(name))
        .collect();
    let target_values = table
        .column(&target)
        .ok_or_else(|| AppError::new(2, format!("Missing target column: `{target}`")))?;
    let weights = match &weights_column {
        Some(w) => {
            let values = table
                .column(w)
                .ok_or_else(|| AppError::new(2, format!("Missing weight column: `{w}`")))?;
            if let Some(bad) = values.iter().find(|v| **v < 0.0) {
                return Err(AppError::new(
                    2,
                    format!("Weight column `{w}` contains a negative value ({bad})."),
                ));
            }
            Some(values)
        }
        None => None,
    };

    info!(
        "loaded {} rows ({} skipped) with {} input columns from {}",
        rows_used,
        table.row_errors.len(),
        inputs.len(),
        config.csv_path.display()
    );

    Ok(IngestedData {
        inputs,
        features,
        target: target_values,
        weights,
        row_errors: table.row_errors,
        rows_read: table.rows_read,
        rows_used,
    })
}

/// Read the (normalized) header row.
pub fn read_headers(path: &Path) -> Result<Vec<String>, AppError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    Ok(headers.iter().map(normalize_header_name).collect())
}

/// Read the named columns as finite `f64`s.
///
/// Rows where any selected cell is missing or not a finite number are
/// skipped and reported in `row_errors`.
pub fn read_numeric_table(path: &Path, names: &[String]) -> Result<NumericTable, AppError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let names: Vec<String> = names.iter().map(|n| normalize_header_name(n)).collect();
    let mut indices = Vec::with_capacity(names.len());
    for name in &names {
        let idx = header_map
            .get(name)
            .copied()
            .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))?;
        indices.push(idx);
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &names, &indices) {
            Ok(values) => {
                for (col, v) in columns.iter_mut().zip(values) {
                    col.push(v);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in &row_errors {
        warn!("skipping line {}: {}", e.line, e.message);
    }

    if columns.first().is_none_or(Vec::is_empty) {
        return Err(AppError::new(2, "No valid rows in CSV."));
    }

    Ok(NumericTable {
        names,
        columns,
        row_errors,
        rows_read,
    })
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn parse_row(record: &StringRecord, names: &[String], indices: &[usize]) -> Result<Vec<f64>, String> {
    names
        .iter()
        .zip(indices)
        .map(|(name, &idx)| {
            let raw = record
                .get(idx)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| format!("missing value for `{name}`"))?;
            let v: f64 = raw
                .parse()
                .map_err(|_| format!("`{name}` is not a number: {raw:?}"))?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(format!("`{name}` is not finite: {raw:?}"))
            }
        })
        .collect()
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿x"). If we don't strip it, schema validation will
    // incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;
    use crate::domain::Intercept;

    fn write_csv(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("data.csv");
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn config(path: PathBuf) -> FitConfig {
        FitConfig {
            csv_path: path,
            target: "z".to_string(),
            features: None,
            weights_column: None,
            intercept: Intercept::Estimate,
            degree: 1,
            robust: false,
            robust_iterations: 8,
            robust_epsilon: 1e-16,
            plot: false,
            plot_width: 60,
            plot_height: 15,
            export_results: None,
            export_model: None,
        }
    }

    #[test]
    fn headers_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "\u{feff}X , Y\n1,2\n");
        assert_eq!(read_headers(&path).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn all_non_target_columns_become_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "x,z,y\n1,10,2\n2,20,3\n3,30,5\n");
        let data = load_fit_data(&config(path)).unwrap();

        assert_eq!(data.inputs, vec!["x", "y"]);
        assert_eq!(data.features[1].as_slice(), &[2.0, 3.0, 5.0]);
        assert_eq!(data.target.as_slice(), &[10.0, 20.0, 30.0]);
        assert!(data.weights.is_none());
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "x,z\n1,10\nfoo,20\n3,\n4,40\n5,inf\n");
        let data = load_fit_data(&config(path)).unwrap();

        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 6]);
    }

    #[test]
    fn weight_column_is_excluded_from_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "x,w,z\n1,1,10\n2,0,20\n3,0.5,30\n");
        let mut cfg = config(path);
        cfg.weights_column = Some("w".to_string());
        let data = load_fit_data(&cfg).unwrap();

        assert_eq!(data.inputs, vec!["x"]);
        assert_eq!(data.weights.unwrap().as_slice(), &[1.0, 0.0, 0.5]);
    }

    #[test]
    fn missing_columns_fail_with_exit_code_2() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "x,z\n1,10\n");
        let mut cfg = config(path);
        cfg.features = Some(vec!["nope".to_string()]);
        let err = load_fit_data(&cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn negative_weights_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "x,w,z\n1,1,10\n2,-1,20\n");
        let mut cfg = config(path);
        cfg.weights_column = Some("w".to_string());
        assert!(load_fit_data(&cfg).is_err());
    }
}
