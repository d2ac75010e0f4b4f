//! Export per-observation results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::domain::ResidualRow;
use crate::error::AppError;

/// Write per-observation results to a CSV file.
pub fn write_results_csv(path: &Path, rows: &[ResidualRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writer
        .write_record(["row", "observed", "fitted", "residual", "weight"])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in rows {
        writer
            .write_record([
                r.row.to_string(),
                format!("{:.10}", r.observed),
                format!("{:.10}", r.fitted),
                format!("{:.10}", r.residual),
                format!("{:.10}", r.weight),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write predictions (one per input row) to a CSV file.
pub fn write_predictions_csv(path: &Path, predictions: &[f64]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(2, format!("Failed to create prediction CSV '{}': {e}", path.display()))
    })?;

    writer
        .write_record(["row", "predicted"])
        .map_err(|e| AppError::new(2, format!("Failed to write prediction CSV header: {e}")))?;
    for (i, p) in predictions.iter().enumerate() {
        writer
            .write_record([i.to_string(), format!("{p:.10}")])
            .map_err(|e| AppError::new(2, format!("Failed to write prediction CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush prediction CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![ResidualRow {
            row: 0,
            observed: 1.0,
            fitted: 1.5,
            residual: 0.5,
            weight: 1.0,
        }];
        write_results_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("row,observed,fitted,residual,weight"));
        assert_eq!(
            lines.next(),
            Some("0,1.0000000000,1.5000000000,0.5000000000,1.0000000000")
        );
        assert_eq!(lines.next(), None);
    }
}
