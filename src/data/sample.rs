//! Synthetic polynomial-surface samples with seeded outliers.
//!
//! The demo data set is a regular `(x, y)` grid with target
//!
//! ```text
//! z = c + 0.25x + 0.125y + 0.0625xy + 2x² + 4y²
//! ```
//!
//! plus optional Gaussian noise and a handful of gross corruptions, which is
//! the canonical case where ordinary least squares is dragged off the truth
//! and the biweight loop is not.

use nalgebra::DVector;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;
use crate::math::square;

/// Slopes of the demo surface, in `surface_features` order.
pub const SURFACE_SLOPES: [f64; 5] = [0.25, 0.125, 0.0625, 2.0, 4.0];

/// Names of the `surface_features` columns.
pub const SURFACE_TERMS: [&str; 5] = ["x", "y", "x*y", "x^2", "y^2"];

#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Grid size along x (`x ∈ {0, .., nx-1}`).
    pub nx: usize,
    /// Grid size along y (`y ∈ {1, .., ny}`).
    pub ny: usize,
    /// Constant term of the surface.
    pub intercept: f64,
    /// Number of corrupted observations.
    pub outliers: usize,
    /// Typical size of a corruption (absolute offset).
    pub outlier_scale: f64,
    /// Standard deviation of the Gaussian noise added to every observation.
    pub noise: f64,
    pub seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            nx: 5,
            ny: 4,
            intercept: 0.5,
            outliers: 1,
            outlier_scale: 500.0,
            noise: 0.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridSample {
    pub x: DVector<f64>,
    pub y: DVector<f64>,
    /// Noise-free target.
    pub clean: DVector<f64>,
    /// Target with noise and corruptions applied.
    pub target: DVector<f64>,
    /// Sorted indices of the corrupted observations.
    pub corrupted: Vec<usize>,
}

/// Cartesian grid flattened row-major with `x` varying fastest.
pub fn mesh_grid(xs: &[f64], ys: &[f64]) -> (DVector<f64>, DVector<f64>) {
    let n = xs.len() * ys.len();
    let mut gx = Vec::with_capacity(n);
    let mut gy = Vec::with_capacity(n);
    for &y in ys {
        for &x in xs {
            gx.push(x);
            gy.push(y);
        }
    }
    (DVector::from_vec(gx), DVector::from_vec(gy))
}

/// The demo surface evaluated at one point.
pub fn quadratic_surface(x: f64, y: f64, intercept: f64) -> f64 {
    let [a, b, c, d, e] = SURFACE_SLOPES;
    intercept + a * x + b * y + c * x * y + d * x * x + e * y * y
}

/// Feature columns `[x, y, xy, x², y²]` for the demo surface.
pub fn surface_features(x: &DVector<f64>, y: &DVector<f64>) -> Vec<DVector<f64>> {
    vec![
        x.clone(),
        y.clone(),
        x.component_mul(y),
        square(x),
        square(y),
    ]
}

pub fn generate_grid_sample(config: &DemoConfig) -> Result<GridSample, AppError> {
    // Each axis needs three distinct values for its square term to be
    // identifiable; that also leaves more rows than surface parameters.
    if config.nx < 3 || config.ny < 3 {
        return Err(AppError::input(format!(
            "Demo grid must be at least 3x3 (got {}x{}).",
            config.nx, config.ny
        )));
    }
    let n = config.nx * config.ny;
    if config.outliers * 2 >= n {
        return Err(AppError::input(
            format!("Too many outliers ({}) for {n} observations; must be fewer than half.", config.outliers),
        ));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::input("Noise level must be finite and >= 0."));
    }
    if !(config.outlier_scale.is_finite() && config.outlier_scale > 0.0) {
        return Err(AppError::input("Outlier scale must be finite and > 0."));
    }

    let xs: Vec<f64> = (0..config.nx).map(|i| i as f64).collect();
    let ys: Vec<f64> = (1..=config.ny).map(|i| i as f64).collect();
    let (x, y) = mesh_grid(&xs, &ys);

    let clean = x.zip_map(&y, |xi, yi| quadratic_surface(xi, yi, config.intercept));

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut target = clean.clone();
    if config.noise > 0.0 {
        for v in target.iter_mut() {
            *v += config.noise * normal.sample(&mut rng);
        }
    }

    let mut corrupted = rand::seq::index::sample(&mut rng, n, config.outliers).into_vec();
    corrupted.sort_unstable();
    for &i in &corrupted {
        let sign = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
        let magnitude = config.outlier_scale * rng.gen_range(0.5..1.5);
        target[i] += sign * magnitude;
    }

    Ok(GridSample {
        x,
        y,
        clean,
        target,
        corrupted,
    })
}
