//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for prediction

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How the constant term of the linear model is handled.
///
/// With `Estimate` and `Fixed`, the design matrix carries a leading column of
/// ones and `parameters[0]` is the intercept. With `None` there is no constant
/// column and `parameters[0]` is the first slope.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum Intercept {
    /// No constant term.
    None,
    /// Estimate the constant term from the data.
    #[default]
    Estimate,
    /// Constant term fixed to a known value; only the slopes are estimated.
    Fixed(f64),
}

impl Intercept {
    /// Whether the design matrix carries a leading column of ones.
    pub fn has_constant_column(self) -> bool {
        !matches!(self, Intercept::None)
    }

    pub fn fixed_value(self) -> Option<f64> {
        match self {
            Intercept::Fixed(c) => Some(c),
            _ => None,
        }
    }
}

/// `true` estimates the intercept, `false` omits it.
impl From<bool> for Intercept {
    fn from(estimate: bool) -> Self {
        if estimate {
            Intercept::Estimate
        } else {
            Intercept::None
        }
    }
}

impl fmt::Display for Intercept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intercept::None => write!(f, "none"),
            Intercept::Estimate => write!(f, "estimated"),
            Intercept::Fixed(c) => write!(f, "fixed at {c}"),
        }
    }
}

/// CLI spelling of `Intercept` (the fixed value comes from a separate flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterceptMode {
    Estimate,
    None,
    Fixed,
}

impl InterceptMode {
    /// Combine the mode with the optional `--intercept-value`.
    pub fn resolve(self, value: Option<f64>) -> Result<Intercept, AppError> {
        match (self, value) {
            (InterceptMode::Fixed, Some(c)) if c.is_finite() => Ok(Intercept::Fixed(c)),
            (InterceptMode::Fixed, Some(c)) => Err(AppError::new(
                2,
                format!("Invalid --intercept-value {c}: must be finite."),
            )),
            (InterceptMode::Fixed, None) => Err(AppError::new(
                2,
                "--intercept fixed requires --intercept-value.",
            )),
            (_, Some(_)) => Err(AppError::new(
                2,
                "--intercept-value is only valid with --intercept fixed.",
            )),
            (InterceptMode::Estimate, None) => Ok(Intercept::Estimate),
            (InterceptMode::None, None) => Ok(Intercept::None),
        }
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    /// Sum of squared residuals (unweighted).
    pub sse: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub n: usize,
    pub features: usize,
}

/// A per-observation fitted result (used for reports and exports).
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualRow {
    /// Zero-based row index in the input.
    pub row: usize,
    pub observed: f64,
    pub fitted: f64,
    pub residual: f64,
    /// Weight the observation carried in the final solve.
    pub weight: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_path: PathBuf,
    pub target: String,
    /// Input columns; `None` means every column except target and weights.
    pub features: Option<Vec<String>>,
    /// Optional per-row weight column for a plain weighted fit.
    pub weights_column: Option<String>,
    pub intercept: Intercept,
    /// Total polynomial degree applied to the input columns (1 = linear).
    pub degree: usize,

    pub robust: bool,
    pub robust_iterations: usize,
    pub robust_epsilon: f64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
}

/// A saved model file (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub created: DateTime<Utc>,
    pub target: String,
    /// Raw input columns, in the order the expansion expects them.
    pub inputs: Vec<String>,
    pub degree: usize,
    pub intercept: Intercept,
    pub robust: bool,
    /// One name per parameter (`"(intercept)"` first when present).
    pub terms: Vec<String>,
    pub parameters: Vec<f64>,
    pub quality: FitQuality,
}
