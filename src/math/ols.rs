//! Normal-equation solver.
//!
//! Every fit in this crate reduces to a small square system
//!
//! ```text
//! (Xᵗ W X) β = Xᵗ W y
//! ```
//!
//! where `W` is diagonal (all ones for ordinary least squares). The coefficient
//! matrix is symmetric positive (semi-)definite, so we try a Cholesky
//! factorization first and fall back to LU with partial pivoting when the
//! matrix is only semi-definite up to rounding.

use nalgebra::{DMatrix, DVector};

use crate::error::RegressionError;

/// Solve `a · x = b` for a square coefficient matrix.
///
/// Fails with `Singular` if neither factorization yields a finite solution.
pub fn solve_normal_equations(
    a: DMatrix<f64>,
    b: &DVector<f64>,
) -> Result<DVector<f64>, RegressionError> {
    if a.nrows() != a.ncols() {
        return Err(RegressionError::SizeMismatch {
            what: "normal matrix columns",
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if b.len() != a.nrows() {
        return Err(RegressionError::SizeMismatch {
            what: "normal right-hand side",
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    let beta = match a.clone().cholesky() {
        Some(chol) => chol.solve(b),
        None => a.lu().solve(b).ok_or(RegressionError::Singular)?,
    };

    if beta.iter().all(|v| v.is_finite()) {
        Ok(beta)
    } else {
        Err(RegressionError::Singular)
    }
}
