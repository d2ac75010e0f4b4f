//! Terminal formatting for fit, demo and prediction output.

use crate::app::pipeline::{DemoRun, FitRun, INTERCEPT_TERM};
use crate::data::SURFACE_TERMS;
use crate::domain::{FitConfig, ResidualRow};

/// Format the full run summary (dataset + parameters + diagnostics).
pub fn format_fit_summary(run: &FitRun, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== rlsq - least squares fit ===\n");
    out.push_str(&format!("Input: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Rows: used={} read={} skipped={}\n",
        run.data.rows_used,
        run.data.rows_read,
        run.data.row_errors.len()
    ));
    out.push_str(&format!(
        "Target: {} | inputs: {} | degree: {}\n",
        config.target,
        run.data.inputs.join(", "),
        config.degree
    ));
    out.push_str(&format!("Intercept: {}\n", config.intercept));

    match run.robust_rounds {
        Some(rounds) => out.push_str(&format!(
            "Method: robust biweight IRLS ({rounds} of {} rounds, epsilon={:e})\n",
            config.robust_iterations, config.robust_epsilon
        )),
        None if run.data.weights.is_some() => out.push_str("Method: weighted least squares\n"),
        None => out.push_str("Method: ordinary least squares\n"),
    }

    out.push_str("\nParameters:\n");
    out.push_str(&format_parameters(&run.terms, run.parameters.as_slice()));

    out.push_str("\nDiagnostics:\n");
    out.push_str(&format!(
        "  SSE={:.6e} RMSE={:.6e} R2={:.6} (n={}, features={})\n",
        run.quality.sse, run.quality.rmse, run.quality.r_squared, run.quality.n, run.quality.features
    ));
    if run.robust_rounds.is_some() || run.data.weights.is_some() {
        out.push_str(&format!(
            "  excluded (weight 0)={} down-weighted={}\n",
            run.excluded(),
            run.downweighted()
        ));
    }

    out
}

/// Two-column table of term names and values.
pub fn format_parameters(terms: &[String], values: &[f64]) -> String {
    let width = terms.iter().map(String::len).max().unwrap_or(4).max(4);
    let mut out = String::new();
    for (term, value) in terms.iter().zip(values) {
        out.push_str(&format!("  {term:<width$} {value:>+.12e}\n"));
    }
    out
}

/// The rows the final solve excluded or down-weighted, largest residual first.
pub fn format_outliers(rows: &[ResidualRow], top_n: usize) -> String {
    let mut flagged: Vec<&ResidualRow> = rows.iter().filter(|r| r.weight < 1.0).collect();
    flagged.sort_by(|a, b| b.residual.abs().total_cmp(&a.residual.abs()));

    let mut out = String::new();
    if flagged.is_empty() {
        out.push_str("No observations were down-weighted.\n");
        return out;
    }

    out.push_str(&format!(
        "{:>6} {:>14} {:>14} {:>14} {:>8}\n",
        "row", "observed", "fitted", "residual", "weight"
    ));
    for r in flagged.into_iter().take(top_n) {
        out.push_str(&format!(
            "{:>6} {:>14.6} {:>14.6} {:>14.6} {:>8.4}\n",
            r.row, r.observed, r.fitted, r.residual, r.weight
        ));
    }
    out
}

/// Side-by-side OLS vs robust parameters for the demo surface.
pub fn format_demo(run: &DemoRun) -> String {
    let mut out = String::new();
    out.push_str("=== rlsq demo - quadratic surface with corrupted rows ===\n");
    out.push_str(&format!(
        "Observations: {} | corrupted rows: {:?} | robust rounds: {}\n\n",
        run.sample.target.len(),
        run.sample.corrupted,
        run.robust_rounds
    ));

    let terms = std::iter::once(INTERCEPT_TERM).chain(SURFACE_TERMS);
    out.push_str(&format!(
        "{:<12} {:>14} {:>14} {:>14}\n",
        "term", "truth", "ols", "robust"
    ));
    for (i, term) in terms.enumerate() {
        out.push_str(&format!(
            "{:<12} {:>14.6} {:>14.6} {:>14.6}\n",
            term, run.truth[i], run.ols[i], run.robust[i]
        ));
    }

    let excluded: Vec<usize> = run
        .weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w == 0.0)
        .map(|(i, _)| i)
        .collect();
    out.push_str(&format!("\nExcluded by robust fit: {excluded:?}\n"));
    out
}

/// One prediction per line, prefixed by its row index.
pub fn format_predictions(predictions: &[f64]) -> String {
    let mut out = String::new();
    for (i, p) in predictions.iter().enumerate() {
        out.push_str(&format!("{i}\t{p:.10}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_table_aligns_names() {
        let terms = vec!["(intercept)".to_string(), "x".to_string()];
        let txt = format_parameters(&terms, &[0.5, -2.0]);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  (intercept) +5.0"));
        assert!(lines[1].starts_with("  x           -2.0"));
    }

    #[test]
    fn outliers_are_sorted_by_residual_size() {
        let rows = vec![
            ResidualRow { row: 0, observed: 1.0, fitted: 1.0, residual: 0.0, weight: 1.0 },
            ResidualRow { row: 1, observed: 1.0, fitted: 3.0, residual: 2.0, weight: 0.5 },
            ResidualRow { row: 2, observed: 9.0, fitted: 1.0, residual: -8.0, weight: 0.0 },
        ];
        let txt = format_outliers(&rows, 10);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_start().starts_with('2'));
        assert!(lines[2].trim_start().starts_with('1'));
    }

    #[test]
    fn no_outliers_message() {
        let rows = vec![ResidualRow { row: 0, observed: 1.0, fitted: 1.0, residual: 0.0, weight: 1.0 }];
        assert_eq!(format_outliers(&rows, 5), "No observations were down-weighted.\n");
    }
}
