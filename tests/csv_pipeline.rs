//! CSV ingest -> fit -> export -> predict, through the library pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;

use robust_lsq::app::pipeline::{model_file, run_fit, run_predict_from_path};
use robust_lsq::domain::{FitConfig, Intercept};
use robust_lsq::io::{read_model_json, write_model_json, write_results_csv};

fn write_surface_csv(dir: &Path, corrupt: bool) -> PathBuf {
    let mut body = String::from("x,y,z\n");
    let mut i = 0;
    for y in 1..=4 {
        for x in 0..5 {
            let (xf, yf) = (x as f64, y as f64);
            let mut z = 0.5 + 3.0 * xf - 1.5 * yf;
            if corrupt && i == 12 {
                z = 800.0;
            }
            body.push_str(&format!("{xf},{yf},{z}\n"));
            i += 1;
        }
    }
    let path = dir.join("surface.csv");
    fs::write(&path, body).unwrap();
    path
}

fn config(csv_path: PathBuf) -> FitConfig {
    FitConfig {
        csv_path,
        target: "z".to_string(),
        features: Some(vec!["x".to_string(), "y".to_string()]),
        weights_column: None,
        intercept: Intercept::Estimate,
        degree: 1,
        robust: false,
        robust_iterations: 8,
        robust_epsilon: 1e-9,
        plot: false,
        plot_width: 60,
        plot_height: 15,
        export_results: None,
        export_model: None,
    }
}

#[test]
fn plane_fit_round_trips_through_model_json() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_surface_csv(dir.path(), false);
    let cfg = config(csv.clone());

    let run = run_fit(&cfg).unwrap();
    assert_eq!(run.terms, vec!["(intercept)", "x", "y"]);
    assert_abs_diff_eq!(run.parameters[0], 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(run.parameters[1], 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(run.parameters[2], -1.5, epsilon = 1e-9);
    assert_abs_diff_eq!(run.quality.r_squared, 1.0, epsilon = 1e-9);

    let model_path = dir.path().join("model.json");
    write_model_json(&model_path, &model_file(&cfg, &run)).unwrap();
    let model = read_model_json(&model_path).unwrap();
    assert_eq!(model.intercept, Intercept::Estimate);

    let predictions = run_predict_from_path(&model_path, &csv).unwrap();
    assert_eq!(predictions.len(), 20);
    for (p, r) in predictions.iter().zip(&run.residuals) {
        assert_abs_diff_eq!(*p, r.observed, epsilon = 1e-8);
    }
}

#[test]
fn robust_fit_flags_the_corrupted_row() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(write_surface_csv(dir.path(), true));
    cfg.robust = true;

    let run = run_fit(&cfg).unwrap();
    assert_abs_diff_eq!(run.parameters[1], 3.0, epsilon = 1e-7);
    assert_eq!(run.residuals[12].weight, 0.0);
    assert_eq!(run.excluded(), 1);
    assert!(run.robust_rounds.unwrap() >= 1);

    let out = dir.path().join("results.csv");
    write_results_csv(&out, &run.residuals).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("row,observed,fitted,residual,weight"));
    assert_eq!(text.lines().count(), 21);
}

#[test]
fn fixed_intercept_survives_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_surface_csv(dir.path(), false);
    let mut cfg = config(csv.clone());
    cfg.intercept = Intercept::Fixed(0.5);

    let run = run_fit(&cfg).unwrap();
    assert_eq!(run.parameters[0], 0.5);

    let model_path = dir.path().join("model.json");
    write_model_json(&model_path, &model_file(&cfg, &run)).unwrap();
    let predictions = run_predict_from_path(&model_path, &csv).unwrap();
    assert_abs_diff_eq!(predictions[0], 0.5 - 1.5, epsilon = 1e-9);
}

#[test]
fn robust_with_weight_column_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.csv");
    fs::write(&path, "x,w,z\n0,1,1\n1,1,3\n2,1,5\n3,1,7\n").unwrap();
    let mut cfg = config(path);
    cfg.features = None;
    cfg.weights_column = Some("w".to_string());
    cfg.robust = true;

    let err = run_fit(&cfg).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}
