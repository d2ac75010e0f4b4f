//! Weighted linear least squares.
//!
//! Given a design matrix `X` (N × F) and targets `y` (length N) we solve the
//! normal equations
//!
//! ```text
//! (Xᵗ W X) β = Xᵗ W y
//! ```
//!
//! with `W = diag(weights)` (all ones for an ordinary fit).
//!
//! Implementation choices:
//! - `X`, `y`, the solve basis and its transpose are copied once at
//!   construction and never mutated afterwards.
//! - The weighted transpose is built by scaling column `i` of the cached
//!   transpose by `weights[i]` (column index = observation index), so an
//!   observation with weight 0 contributes nothing to either side.
//! - A fixed intercept `c` is handled by solving on the raw columns against
//!   `y - c` and prepending `c` to the solution.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitQuality, Intercept};
use crate::error::RegressionError;
use crate::math::{hconcat, solve_normal_equations};

#[derive(Debug, Clone)]
pub struct Regressor {
    /// Design matrix used for prediction (leading ones column unless `Intercept::None`).
    x: DMatrix<f64>,
    y: DVector<f64>,
    /// Matrix the normal equations are formed from.
    basis: DMatrix<f64>,
    basis_t: DMatrix<f64>,
    /// Right-hand side the normal equations are formed from.
    rhs: DVector<f64>,
    intercept: Intercept,
}

impl Regressor {
    /// Build a regressor from a design matrix of raw feature columns.
    ///
    /// Fails if `xs.nrows() != ys.len()`, if `xs` has no columns, or if a fixed
    /// intercept is not finite.
    pub fn new(
        xs: &DMatrix<f64>,
        ys: &DVector<f64>,
        intercept: Intercept,
    ) -> Result<Self, RegressionError> {
        if xs.nrows() != ys.len() {
            return Err(RegressionError::SizeMismatch {
                what: "target",
                expected: xs.nrows(),
                actual: ys.len(),
            });
        }
        if xs.ncols() == 0 {
            return Err(RegressionError::Empty);
        }

        let with_ones = || xs.clone().insert_column(0, 1.0);
        let (x, basis, rhs) = match intercept {
            Intercept::None => (xs.clone(), xs.clone(), ys.clone()),
            Intercept::Estimate => (with_ones(), with_ones(), ys.clone()),
            Intercept::Fixed(c) if c.is_finite() => (with_ones(), xs.clone(), ys.add_scalar(-c)),
            Intercept::Fixed(c) => {
                return Err(RegressionError::OutOfRange {
                    name: "intercept",
                    value: c,
                });
            }
        };
        let basis_t = basis.transpose();

        Ok(Self {
            x,
            y: ys.clone(),
            basis,
            basis_t,
            rhs,
            intercept,
        })
    }

    /// Build a regressor from per-feature column vectors.
    pub fn from_columns(
        columns: &[DVector<f64>],
        ys: &DVector<f64>,
        intercept: Intercept,
    ) -> Result<Self, RegressionError> {
        let xs = hconcat(columns)?;
        Self::new(&xs, ys, intercept)
    }

    /// Number of observations.
    pub fn n(&self) -> usize {
        self.x.nrows()
    }

    /// Number of parameters (design-matrix columns).
    pub fn features(&self) -> usize {
        self.x.ncols()
    }

    /// The design matrix, including the ones column when there is an intercept.
    pub fn x(&self) -> &DMatrix<f64> {
        &self.x
    }

    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }

    pub fn intercept(&self) -> Intercept {
        self.intercept
    }

    /// Ordinary least squares.
    pub fn fit(&self) -> Result<DVector<f64>, RegressionError> {
        self.solve(None)
    }

    /// Weighted least squares.
    ///
    /// `weights` must have length `n()` with finite, nonnegative entries.
    pub fn fit_weighted(&self, weights: &DVector<f64>) -> Result<DVector<f64>, RegressionError> {
        if weights.len() != self.n() {
            return Err(RegressionError::SizeMismatch {
                what: "weights",
                expected: self.n(),
                actual: weights.len(),
            });
        }
        if let Some((index, &value)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(RegressionError::InvalidWeights { index, value });
        }
        self.solve(Some(weights))
    }

    /// Shared solve primitive; `weights` are assumed validated.
    pub(crate) fn solve(&self, weights: Option<&DVector<f64>>) -> Result<DVector<f64>, RegressionError> {
        let beta = match weights {
            None => {
                solve_normal_equations(&self.basis_t * &self.basis, &(&self.basis_t * &self.rhs))?
            }
            Some(w) => {
                let mut wxt = self.basis_t.clone();
                for (i, &wi) in w.iter().enumerate() {
                    wxt.column_mut(i).scale_mut(wi);
                }
                solve_normal_equations(&wxt * &self.basis, &(&wxt * &self.rhs))?
            }
        };

        Ok(match self.intercept {
            Intercept::Fixed(c) => beta.insert_row(0, c),
            Intercept::None | Intercept::Estimate => beta,
        })
    }

    /// Sum of squared residuals.
    pub fn cost(&self, parameters: &DVector<f64>) -> Result<f64, RegressionError> {
        Ok(self.error(parameters)?.norm_squared())
    }

    /// Residuals `predict(X, parameters) - y`, one per observation.
    pub fn error(&self, parameters: &DVector<f64>) -> Result<DVector<f64>, RegressionError> {
        if parameters.len() != self.features() {
            return Err(RegressionError::SizeMismatch {
                what: "parameters",
                expected: self.features(),
                actual: parameters.len(),
            });
        }
        Ok(Self::predict(&self.x, parameters)? - &self.y)
    }

    /// `xs · parameters`.
    ///
    /// `xs` must already contain the ones column when the model has an
    /// intercept; `x()` is such a matrix.
    pub fn predict(
        xs: &DMatrix<f64>,
        parameters: &DVector<f64>,
    ) -> Result<DVector<f64>, RegressionError> {
        if parameters.len() != xs.ncols() {
            return Err(RegressionError::SizeMismatch {
                what: "parameters",
                expected: xs.ncols(),
                actual: parameters.len(),
            });
        }
        Ok(xs * parameters)
    }

    /// SSE, RMSE and R² of `parameters` on this data set.
    pub fn quality(&self, parameters: &DVector<f64>) -> Result<FitQuality, RegressionError> {
        let sse = self.cost(parameters)?;
        let n = self.n();
        let mean = self.y.mean();
        let sst: f64 = self.y.iter().map(|v| (v - mean) * (v - mean)).sum();
        let r_squared = if sst > 0.0 {
            1.0 - sse / sst
        } else if sse == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(FitQuality {
            sse,
            rmse: (sse / n as f64).sqrt(),
            r_squared,
            n,
            features: self.features(),
        })
    }
}

impl std::fmt::Display for Regressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Regressor ({}x{})", self.n(), self.features())
    }
}
