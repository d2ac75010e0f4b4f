//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads CSV data and runs the (robust) fit
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Command, DemoArgs, FitArgs, PredictArgs};
use crate::data::DemoConfig;
use crate::domain::FitConfig;
use crate::error::AppError;
use crate::fit::RobustOptions;

pub mod pipeline;

/// Entry point for the `rlsq` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Predict(args) => handle_predict(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // `RUST_LOG`, when set, takes precedence over the flag.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;

    println!("{}", crate::report::format_fit_summary(&run, &config));
    if run.robust_rounds.is_some() || run.data.weights.is_some() {
        println!("{}", crate::report::format_outliers(&run.residuals, 20));
    }

    if config.plot {
        let plot = crate::plot::render_residual_plot(&run.residuals, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.residuals)?;
    }
    if let Some(path) = &config.export_model {
        let model = pipeline::model_file(&config, &run);
        crate::io::model::write_model_json(path, &model)?;
    }

    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let predictions = pipeline::run_predict_from_path(&args.model, &args.input)?;

    match &args.export {
        Some(path) => crate::io::export::write_predictions_csv(path, &predictions)?,
        None => print!("{}", crate::report::format_predictions(&predictions)),
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = DemoConfig {
        nx: args.nx,
        ny: args.ny,
        outliers: args.outliers,
        outlier_scale: args.outlier_scale,
        noise: args.noise,
        seed: args.seed,
        ..DemoConfig::default()
    };
    let options = RobustOptions {
        iterations: args.iterations,
        epsilon: args.epsilon,
    };

    let run = pipeline::run_demo(&config, &options)?;
    println!("{}", crate::report::format_demo(&run));
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    if args.degree == 0 {
        return Err(AppError::new(2, "--degree must be >= 1."));
    }
    if !(args.epsilon > 0.0) {
        return Err(AppError::new(2, format!("--epsilon must be > 0 (got {}).", args.epsilon)));
    }

    Ok(FitConfig {
        csv_path: args.input.clone(),
        target: args.target.clone(),
        features: args.features.clone(),
        weights_column: args.weights_column.clone(),
        intercept: args.intercept.resolve(args.intercept_value)?,
        degree: args.degree,
        robust: args.robust,
        robust_iterations: args.iterations,
        robust_epsilon: args.epsilon,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_model: args.export_model.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Intercept;

    fn parse_fit(argv: &[&str]) -> FitArgs {
        let mut full = vec!["rlsq", "fit", "-i", "data.csv", "-t", "z"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Fit(args) => args,
            _ => panic!("expected fit"),
        }
    }

    #[test]
    fn config_resolves_intercept() {
        let cfg = fit_config_from_args(&parse_fit(&["--intercept", "none"])).unwrap();
        assert_eq!(cfg.intercept, Intercept::None);

        let cfg = fit_config_from_args(&parse_fit(&[])).unwrap();
        assert_eq!(cfg.intercept, Intercept::Estimate);
        assert_eq!(cfg.degree, 1);
    }

    #[test]
    fn config_rejects_bad_epsilon_and_degree() {
        assert!(fit_config_from_args(&parse_fit(&["--epsilon", "0"])).is_err());
        assert!(fit_config_from_args(&parse_fit(&["--degree", "0"])).is_err());
        assert!(fit_config_from_args(&parse_fit(&["--intercept", "fixed"])).is_err());
    }
}
