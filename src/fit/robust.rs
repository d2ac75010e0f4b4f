//! Outlier-robust fitting by iteratively reweighted least squares.
//!
//! The loop starts from an ordinary fit and, for a fixed budget of rounds:
//!
//! 1. computes absolute residuals `|e_i|`
//! 2. sets a threshold `t = s · median(|e|)` (upper median)
//! 3. assigns Tukey biweight weights `w_i = max(0, 1 - (|e_i| / t)²)²`
//! 4. re-solves the weighted normal equations
//! 5. shrinks the window `s ← max(0.75 s, 1.25)`, starting from `s = 4`
//!
//! Residuals beyond the threshold get weight exactly 0; the loop stops early
//! once the threshold falls to `epsilon` (the data is fitted exactly up to
//! the tolerance). This is a fixed-budget heuristic, not a convergent
//! M-estimator.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::domain::Intercept;
use crate::error::RegressionError;
use crate::fit::Regressor;
use crate::math::upper_median;

/// Threshold multiplier used in the first reweighting round.
pub const INITIAL_SCALE: f64 = 4.0;
/// Per-round shrink factor of the threshold multiplier.
pub const SCALE_DECAY: f64 = 0.75;
/// Lower bound of the threshold multiplier.
pub const MIN_SCALE: f64 = 1.25;

/// Smallest positive subnormal `f64`; guards `1 / threshold` against a zero threshold.
const TINY: f64 = 5e-324;

/// Iteration budget and convergence tolerance for `RobustRegressor::fit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustOptions {
    /// Maximum number of reweighting rounds.
    pub iterations: usize,
    /// Stop once `median · s <= epsilon`. Must be positive.
    ///
    /// The default `1e-16` sits below `f64` rounding of typical residuals, so
    /// on data the model fits exactly the loop keeps reweighting rounding
    /// noise until the round budget runs out. Use something like `1e-9` to
    /// stop as soon as the fit is exact.
    pub epsilon: f64,
}

impl Default for RobustOptions {
    fn default() -> Self {
        Self {
            iterations: 8,
            epsilon: 1e-16,
        }
    }
}

/// Tukey biweight weights for the given absolute residuals.
pub fn biweight_weights(abs_residuals: &[f64], threshold: f64) -> Vec<f64> {
    let inv = 1.0 / (threshold + TINY);
    abs_residuals
        .iter()
        .map(|&e| {
            let v = e * inv;
            let r = (1.0 - v * v).max(0.0);
            r * r
        })
        .collect()
}

/// Robust regressor: a `Regressor` plus the weights of its latest fit.
#[derive(Debug, Clone)]
pub struct RobustRegressor {
    base: Regressor,
    weights: DVector<f64>,
    iterations_run: usize,
}

impl RobustRegressor {
    pub fn new(
        xs: &DMatrix<f64>,
        ys: &DVector<f64>,
        intercept: Intercept,
    ) -> Result<Self, RegressionError> {
        Ok(Self::from_regressor(Regressor::new(xs, ys, intercept)?))
    }

    pub fn from_columns(
        columns: &[DVector<f64>],
        ys: &DVector<f64>,
        intercept: Intercept,
    ) -> Result<Self, RegressionError> {
        Ok(Self::from_regressor(Regressor::from_columns(columns, ys, intercept)?))
    }

    fn from_regressor(base: Regressor) -> Self {
        let weights = DVector::from_element(base.n(), 1.0);
        Self {
            base,
            weights,
            iterations_run: 0,
        }
    }

    /// The underlying (unweighted/weighted) least-squares engine.
    pub fn regressor(&self) -> &Regressor {
        &self.base
    }

    /// Weights of the latest fit; all ones before the first fit.
    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    /// Reweighting rounds completed by the latest fit.
    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }

    pub fn n(&self) -> usize {
        self.base.n()
    }

    pub fn features(&self) -> usize {
        self.base.features()
    }

    pub fn x(&self) -> &DMatrix<f64> {
        self.base.x()
    }

    pub fn y(&self) -> &DVector<f64> {
        self.base.y()
    }

    pub fn cost(&self, parameters: &DVector<f64>) -> Result<f64, RegressionError> {
        self.base.cost(parameters)
    }

    pub fn error(&self, parameters: &DVector<f64>) -> Result<DVector<f64>, RegressionError> {
        self.base.error(parameters)
    }

    /// `fit` with `RobustOptions::default()` (8 rounds, `epsilon = 1e-16`).
    pub fn fit_default(&mut self) -> Result<DVector<f64>, RegressionError> {
        self.fit(&RobustOptions::default())
    }

    /// Run the reweighting loop and return the final parameters.
    ///
    /// On success the stored weights are replaced by those of the final
    /// solve. On failure the previous weights are left untouched.
    pub fn fit(&mut self, options: &RobustOptions) -> Result<DVector<f64>, RegressionError> {
        if !(options.epsilon > 0.0) {
            return Err(RegressionError::OutOfRange {
                name: "epsilon",
                value: options.epsilon,
            });
        }

        let mut weights = DVector::from_element(self.base.n(), 1.0);
        let mut parameters = self.base.fit()?;
        let mut scale = INITIAL_SCALE;
        let mut rounds = 0;

        for round in 0..options.iterations {
            let abs_err: Vec<f64> = self
                .base
                .error(&parameters)?
                .iter()
                .map(|e| e.abs())
                .collect();

            let median = upper_median(&abs_err).unwrap_or(0.0);
            let threshold = median * scale;
            if threshold <= options.epsilon {
                debug!("robust fit converged after {round} rounds (threshold={threshold:e})");
                break;
            }

            weights = DVector::from_vec(biweight_weights(&abs_err, threshold));
            debug!(
                "robust round {round}: median={median:e} scale={scale} threshold={threshold:e} excluded={}",
                weights.iter().filter(|w| **w == 0.0).count()
            );

            parameters = self.base.solve(Some(&weights))?;
            rounds += 1;
            scale = (scale * SCALE_DECAY).max(MIN_SCALE);
        }

        self.weights = weights;
        self.iterations_run = rounds;
        Ok(parameters)
    }
}

impl std::fmt::Display for RobustRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RobustRegressor ({}x{})", self.n(), self.features())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biweight_kernel_shape() {
        let w = biweight_weights(&[0.0, 0.5, 1.0, 2.0], 1.0);
        assert_eq!(w[0], 1.0);
        assert!((w[1] - 0.5625).abs() < 1e-12);
        assert_eq!(w[2], 0.0);
        assert_eq!(w[3], 0.0);
    }

    #[test]
    fn biweight_with_tiny_threshold_stays_finite() {
        let w = biweight_weights(&[0.0, 1.0], 1e-300);
        assert_eq!(w, vec![1.0, 0.0]);
    }

    #[test]
    fn default_options() {
        let opts = RobustOptions::default();
        assert_eq!(opts.iterations, 8);
        assert_eq!(opts.epsilon, 1e-16);
    }

    fn line_with_outlier() -> (DMatrix<f64>, DVector<f64>) {
        // y = 1 + 2x with the last point pushed far off the line.
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut ys: Vec<f64> = xs.iter().map(|x| 1.0 + 2.0 * x).collect();
        ys[9] = 100.0;
        (
            DMatrix::from_column_slice(10, 1, &xs),
            DVector::from_vec(ys),
        )
    }

    #[test]
    fn epsilon_must_be_positive() {
        let (x, y) = line_with_outlier();
        let mut reg = RobustRegressor::new(&x, &y, Intercept::Estimate).unwrap();
        for eps in [0.0, -1.0, f64::NAN] {
            let opts = RobustOptions {
                iterations: 8,
                epsilon: eps,
            };
            assert!(matches!(
                reg.fit(&opts),
                Err(RegressionError::OutOfRange { name: "epsilon", .. })
            ));
        }
    }

    #[test]
    fn weights_start_at_one() {
        let (x, y) = line_with_outlier();
        let reg = RobustRegressor::new(&x, &y, Intercept::Estimate).unwrap();
        assert!(reg.weights().iter().all(|w| *w == 1.0));
        assert_eq!(reg.weights().len(), 10);
        assert_eq!(reg.iterations_run(), 0);
    }

    #[test]
    fn outlier_on_a_line_is_excluded() {
        let (x, y) = line_with_outlier();
        let mut reg = RobustRegressor::new(&x, &y, Intercept::Estimate).unwrap();
        let opts = RobustOptions {
            iterations: 8,
            epsilon: 1e-9,
        };
        let beta = reg.fit(&opts).unwrap();

        assert_eq!(reg.weights()[9], 0.0);
        assert!((beta[0] - 1.0).abs() < 1e-9);
        assert!((beta[1] - 2.0).abs() < 1e-9);
        assert!(reg.iterations_run() >= 1);
    }

    #[test]
    fn zero_iterations_is_plain_ols() {
        let (x, y) = line_with_outlier();
        let mut reg = RobustRegressor::new(&x, &y, Intercept::Estimate).unwrap();
        let opts = RobustOptions {
            iterations: 0,
            epsilon: 1e-9,
        };
        let beta = reg.fit(&opts).unwrap();
        let ols = reg.regressor().fit().unwrap();

        assert_eq!(beta, ols);
        assert!(reg.weights().iter().all(|w| *w == 1.0));
    }
}
