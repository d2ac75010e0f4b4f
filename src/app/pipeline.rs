//! Shared "fit pipeline" logic used by the `fit`, `predict` and `demo` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> feature expansion -> (robust) fit -> residuals -> quality
//!
//! The CLI can then focus on presentation (printing, exports).

use chrono::Utc;
use log::info;
use nalgebra::DVector;

use crate::data::{DemoConfig, GridSample, SURFACE_SLOPES, generate_grid_sample, surface_features};
use crate::domain::{FitConfig, FitQuality, Intercept, ModelFile, ResidualRow};
use crate::error::AppError;
use crate::fit::{Regressor, RobustOptions, RobustRegressor};
use crate::io::ingest::{IngestedData, load_fit_data, read_numeric_table};
use crate::io::model::read_model_json;
use crate::math::{expand_polynomial, hconcat, monomial_name, monomials};

/// Name of the constant term in reports and model files.
pub const INTERCEPT_TERM: &str = "(intercept)";

/// All computed outputs of a single `rlsq fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub data: IngestedData,
    /// One name per parameter.
    pub terms: Vec<String>,
    pub parameters: DVector<f64>,
    pub quality: FitQuality,
    pub residuals: Vec<ResidualRow>,
    /// Reweighting rounds run (robust fits only).
    pub robust_rounds: Option<usize>,
}

impl FitRun {
    /// Observations the final solve ignored entirely.
    pub fn excluded(&self) -> usize {
        self.residuals.iter().filter(|r| r.weight == 0.0).count()
    }

    /// Observations with weight strictly between 0 and 1.
    pub fn downweighted(&self) -> usize {
        self.residuals
            .iter()
            .filter(|r| r.weight > 0.0 && r.weight < 1.0)
            .count()
    }
}

/// Load the CSV named by `config` and fit it.
pub fn run_fit(config: &FitConfig) -> Result<FitRun, AppError> {
    let data = load_fit_data(config)?;
    run_fit_with_data(config, data)
}

/// Fit already-ingested data.
pub fn run_fit_with_data(config: &FitConfig, data: IngestedData) -> Result<FitRun, AppError> {
    let columns = expand_polynomial(&data.features, config.degree)?;
    let terms = term_names(&data.inputs, config.degree, config.intercept);

    let estimated = terms.len() - usize::from(matches!(config.intercept, Intercept::Fixed(_)));
    if data.rows_used < estimated {
        return Err(AppError::new(
            3,
            format!(
                "Not enough rows to fit: {} rows for {} estimated parameters.",
                data.rows_used, estimated
            ),
        ));
    }
    info!(
        "fitting {} rows x {} terms (intercept {}, robust={})",
        data.rows_used,
        terms.len(),
        config.intercept,
        config.robust
    );

    let (regressor, parameters, weights, robust_rounds) = if config.robust {
        if data.weights.is_some() {
            return Err(AppError::new(
                2,
                "A weight column cannot be combined with --robust (robust weights are computed).",
            ));
        }
        let mut robust = RobustRegressor::from_columns(&columns, &data.target, config.intercept)?;
        let options = RobustOptions {
            iterations: config.robust_iterations,
            epsilon: config.robust_epsilon,
        };
        let parameters = robust.fit(&options)?;
        let rounds = robust.iterations_run();
        let weights = robust.weights().clone();
        (robust.regressor().clone(), parameters, weights, Some(rounds))
    } else {
        let regressor = Regressor::from_columns(&columns, &data.target, config.intercept)?;
        let (parameters, weights) = match &data.weights {
            Some(w) => (regressor.fit_weighted(w)?, w.clone()),
            None => (regressor.fit()?, DVector::from_element(regressor.n(), 1.0)),
        };
        (regressor, parameters, weights, None)
    };

    let quality = regressor.quality(&parameters)?;
    let residuals = residual_rows(&regressor, &parameters, &weights)?;

    Ok(FitRun {
        data,
        terms,
        parameters,
        quality,
        residuals,
        robust_rounds,
    })
}

/// Per-observation fitted values; `residual = fitted - observed`.
pub fn residual_rows(
    regressor: &Regressor,
    parameters: &DVector<f64>,
    weights: &DVector<f64>,
) -> Result<Vec<ResidualRow>, AppError> {
    let errors = regressor.error(parameters)?;
    Ok(regressor
        .y()
        .iter()
        .zip(errors.iter())
        .zip(weights.iter())
        .enumerate()
        .map(|(row, ((&observed, &residual), &weight))| ResidualRow {
            row,
            observed,
            fitted: observed + residual,
            residual,
            weight,
        })
        .collect())
}

/// Parameter names: the intercept (if any) followed by every monomial.
pub fn term_names(inputs: &[String], degree: usize, intercept: Intercept) -> Vec<String> {
    let mut out = Vec::new();
    if intercept.has_constant_column() {
        out.push(INTERCEPT_TERM.to_string());
    }
    out.extend(
        monomials(inputs.len(), degree)
            .iter()
            .map(|term| monomial_name(inputs, term)),
    );
    out
}

/// Portable model description of a finished run.
pub fn model_file(config: &FitConfig, run: &FitRun) -> ModelFile {
    ModelFile {
        tool: "rlsq".to_string(),
        created: Utc::now(),
        target: config.target.clone(),
        inputs: run.data.inputs.clone(),
        degree: config.degree,
        intercept: config.intercept,
        robust: config.robust,
        terms: run.terms.clone(),
        parameters: run.parameters.iter().copied().collect(),
        quality: run.quality.clone(),
    }
}

/// Evaluate a saved model on the input columns of a CSV file.
pub fn run_predict(model: &ModelFile, csv_path: &std::path::Path) -> Result<Vec<f64>, AppError> {
    let table = read_numeric_table(csv_path, &model.inputs)?;
    let inputs: Vec<DVector<f64>> = table
        .columns
        .iter()
        .map(|c| DVector::from_column_slice(c))
        .collect();

    let columns = expand_polynomial(&inputs, model.degree)?;
    let mut xs = hconcat(&columns)?;
    if model.intercept.has_constant_column() {
        xs = xs.insert_column(0, 1.0);
    }

    let parameters = DVector::from_column_slice(&model.parameters);
    let predicted = Regressor::predict(&xs, &parameters)?;
    Ok(predicted.iter().copied().collect())
}

/// Load a model JSON and evaluate it on a CSV file.
pub fn run_predict_from_path(
    model_path: &std::path::Path,
    csv_path: &std::path::Path,
) -> Result<Vec<f64>, AppError> {
    let model = read_model_json(model_path)?;
    run_predict(&model, csv_path)
}

/// Ordinary vs robust fit of the synthetic demo surface.
#[derive(Debug, Clone)]
pub struct DemoRun {
    pub sample: GridSample,
    pub truth: Vec<f64>,
    pub ols: DVector<f64>,
    pub robust: DVector<f64>,
    pub weights: DVector<f64>,
    pub robust_rounds: usize,
}

pub fn run_demo(config: &DemoConfig, options: &RobustOptions) -> Result<DemoRun, AppError> {
    let sample = generate_grid_sample(config)?;
    let columns = surface_features(&sample.x, &sample.y);

    let ols = Regressor::from_columns(&columns, &sample.target, Intercept::Estimate)?.fit()?;

    let mut robust = RobustRegressor::from_columns(&columns, &sample.target, Intercept::Estimate)?;
    let robust_params = robust.fit(options)?;

    let mut truth = vec![config.intercept];
    truth.extend_from_slice(&SURFACE_SLOPES);

    Ok(DemoRun {
        truth,
        ols,
        robust: robust_params,
        weights: robust.weights().clone(),
        robust_rounds: robust.iterations_run(),
        sample,
    })
}
