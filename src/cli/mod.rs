//! Command-line parsing for the `rlsq` least-squares fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::InterceptMode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rlsq", version, about = "Weighted and robust (biweight IRLS) linear least squares")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a linear model to columns of a CSV file.
    Fit(FitArgs),
    /// Evaluate a saved model JSON on a CSV file.
    Predict(PredictArgs),
    /// Fit a synthetic quadratic surface with corrupted rows (OLS vs robust).
    Demo(DemoArgs),
}

/// Options for fitting a CSV file.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input CSV (header row required).
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Target column.
    #[arg(short, long)]
    pub target: String,

    /// Feature columns (comma separated). Defaults to every other column.
    #[arg(short, long, value_delimiter = ',')]
    pub features: Option<Vec<String>>,

    /// Column of per-row weights for a weighted (non-robust) fit.
    #[arg(long)]
    pub weights_column: Option<String>,

    /// How to handle the constant term.
    #[arg(long, value_enum, default_value_t = InterceptMode::Estimate)]
    pub intercept: InterceptMode,

    /// Value of the constant term for `--intercept fixed`.
    #[arg(long, allow_hyphen_values = true)]
    pub intercept_value: Option<f64>,

    /// Total polynomial degree of the expanded features (1 = linear).
    #[arg(long, default_value_t = 1)]
    pub degree: usize,

    /// Down-weight outliers with biweight IRLS.
    #[arg(long)]
    pub robust: bool,

    /// Maximum number of reweighting rounds.
    #[arg(long, default_value_t = 8)]
    pub iterations: usize,

    /// Stop reweighting once the residual threshold falls to this value.
    #[arg(long, default_value_t = 1e-16)]
    pub epsilon: f64,

    /// Render an ASCII residual plot.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export per-row results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fitted model to JSON.
    #[arg(long = "export-model")]
    pub export_model: Option<PathBuf>,
}

/// Options for predicting with a saved model.
#[derive(Debug, Parser)]
pub struct PredictArgs {
    /// Model JSON produced by `rlsq fit --export-model`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// CSV containing the model's input columns.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Write predictions to CSV instead of stdout.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for the synthetic demo.
#[derive(Debug, Parser)]
pub struct DemoArgs {
    /// Grid size along x.
    #[arg(long, default_value_t = 5)]
    pub nx: usize,

    /// Grid size along y.
    #[arg(long, default_value_t = 4)]
    pub ny: usize,

    /// Number of corrupted observations.
    #[arg(long, default_value_t = 1)]
    pub outliers: usize,

    /// Typical absolute size of a corruption.
    #[arg(long, default_value_t = 500.0)]
    pub outlier_scale: f64,

    /// Gaussian noise standard deviation.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum number of reweighting rounds.
    #[arg(long, default_value_t = 8)]
    pub iterations: usize,

    /// Reweighting tolerance.
    #[arg(long, default_value_t = 1e-9)]
    pub epsilon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_args_parse_feature_list_and_fixed_intercept() {
        let cli = Cli::parse_from([
            "rlsq",
            "fit",
            "-i",
            "data.csv",
            "-t",
            "z",
            "--features",
            "x,y",
            "--intercept",
            "fixed",
            "--intercept-value",
            "-2.5",
            "--robust",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.features, Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(args.intercept, InterceptMode::Fixed);
        assert_eq!(args.intercept_value, Some(-2.5));
        assert!(args.robust);
        assert_eq!(args.iterations, 8);
        assert_eq!(args.epsilon, 1e-16);
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::parse_from(["rlsq", "demo", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Demo(_)));
    }
}
