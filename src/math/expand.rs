//! Feature expansion helpers.
//!
//! Polynomial design matrices are built from raw inputs by applying
//! element-wise transforms to feature vectors before they are concatenated:
//!
//! - `square`, `cube`, `pow`: direct per-element maps
//! - `monomials` / `expand_polynomial`: every product of input columns with
//!   total degree `1..=degree`
//! - `hconcat`: column vectors -> N×F design matrix

use nalgebra::{DMatrix, DVector};

use crate::error::RegressionError;

/// Element-wise `v²`.
pub fn square(v: &DVector<f64>) -> DVector<f64> {
    v.map(|x| x * x)
}

/// Element-wise `v³`.
pub fn cube(v: &DVector<f64>) -> DVector<f64> {
    v.map(|x| x * x * x)
}

/// Element-wise `vⁿ`.
pub fn pow(v: &DVector<f64>, n: i32) -> DVector<f64> {
    v.map(|x| x.powi(n))
}

/// Concatenate column vectors horizontally into a design matrix.
pub fn hconcat(columns: &[DVector<f64>]) -> Result<DMatrix<f64>, RegressionError> {
    let Some(first) = columns.first() else {
        return Err(RegressionError::Empty);
    };
    let n = first.len();
    if let Some(bad) = columns.iter().find(|c| c.len() != n) {
        return Err(RegressionError::SizeMismatch {
            what: "feature column",
            expected: n,
            actual: bad.len(),
        });
    }
    Ok(DMatrix::from_columns(columns))
}

/// Enumerate monomials over `n_columns` inputs with total degree `1..=degree`.
///
/// Each monomial is a non-decreasing list of column indices, e.g. `[0, 0, 1]`
/// for `x0² · x1`. Ordered by degree first, then lexicographically.
pub fn monomials(n_columns: usize, degree: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    for d in 1..=degree {
        let mut current = Vec::with_capacity(d);
        push_combinations(n_columns, d, 0, &mut current, &mut out);
    }
    out
}

fn push_combinations(
    n_columns: usize,
    remaining: usize,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if remaining == 0 {
        out.push(current.clone());
        return;
    }
    for j in start..n_columns {
        current.push(j);
        push_combinations(n_columns, remaining - 1, j, current, out);
        current.pop();
    }
}

/// Evaluate every monomial from `monomials(columns.len(), degree)`.
///
/// `degree = 1` returns the inputs unchanged.
pub fn expand_polynomial(
    columns: &[DVector<f64>],
    degree: usize,
) -> Result<Vec<DVector<f64>>, RegressionError> {
    if degree == 0 {
        return Err(RegressionError::OutOfRange {
            name: "degree",
            value: 0.0,
        });
    }
    let Some(first) = columns.first() else {
        return Err(RegressionError::Empty);
    };
    let n = first.len();

    let mut out = Vec::new();
    for term in monomials(columns.len(), degree) {
        let mut value = DVector::from_element(n, 1.0);
        for (j, count) in run_lengths(&term) {
            let factor = match count {
                1 => columns[j].clone(),
                2 => square(&columns[j]),
                3 => cube(&columns[j]),
                k => pow(&columns[j], k as i32),
            };
            if factor.len() != n {
                return Err(RegressionError::SizeMismatch {
                    what: "feature column",
                    expected: n,
                    actual: factor.len(),
                });
            }
            value.component_mul_assign(&factor);
        }
        out.push(value);
    }
    Ok(out)
}

/// Human-readable monomial name, e.g. `x^2*y`.
pub fn monomial_name(names: &[String], term: &[usize]) -> String {
    run_lengths(term)
        .into_iter()
        .map(|(j, count)| {
            let name = names.get(j).map(String::as_str).unwrap_or("?");
            if count == 1 {
                name.to_string()
            } else {
                format!("{name}^{count}")
            }
        })
        .collect::<Vec<_>>()
        .join("*")
}

fn run_lengths(term: &[usize]) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::new();
    for &j in term {
        match out.last_mut() {
            Some((last, count)) if *last == j => *count += 1,
            _ => out.push((j, 1)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elementwise_powers() {
        let v = DVector::from_row_slice(&[-2.0, 0.5, 3.0]);
        assert_eq!(square(&v).as_slice(), &[4.0, 0.25, 9.0]);
        assert_eq!(cube(&v).as_slice(), &[-8.0, 0.125, 27.0]);
        assert_eq!(pow(&v, 4).as_slice(), &[16.0, 0.0625, 81.0]);
        assert_eq!(pow(&v, 0).as_slice(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn hconcat_builds_column_major_design() {
        let a = DVector::from_row_slice(&[1.0, 2.0]);
        let b = DVector::from_row_slice(&[3.0, 4.0]);
        let m = hconcat(&[a, b]).unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m[(1, 0)], 2.0);
        assert_eq!(m[(0, 1)], 3.0);
    }

    #[test]
    fn hconcat_rejects_ragged_columns() {
        let a = DVector::from_row_slice(&[1.0, 2.0]);
        let b = DVector::from_row_slice(&[3.0]);
        assert!(matches!(
            hconcat(&[a, b]),
            Err(RegressionError::SizeMismatch { expected: 2, actual: 1, .. })
        ));
        assert_eq!(hconcat(&[]), Err(RegressionError::Empty));
    }

    #[test]
    fn monomials_for_two_inputs_degree_two() {
        assert_eq!(
            monomials(2, 2),
            vec![vec![0], vec![1], vec![0, 0], vec![0, 1], vec![1, 1]]
        );
        // C(n + d, d) - 1 terms in total.
        assert_eq!(monomials(3, 3).len(), 19);
    }

    #[test]
    fn expand_polynomial_evaluates_products() {
        let x = DVector::from_row_slice(&[1.0, 2.0]);
        let y = DVector::from_row_slice(&[3.0, 5.0]);
        let cols = expand_polynomial(&[x, y], 3).unwrap();

        // x, y, x², xy, y², x³, x²y, xy², y³
        assert_eq!(cols.len(), 9);
        assert_eq!(cols[3].as_slice(), &[3.0, 10.0]);
        assert_eq!(cols[6].as_slice(), &[3.0, 20.0]);
        assert_eq!(cols[8].as_slice(), &[27.0, 125.0]);
    }

    #[test]
    fn monomial_names_collapse_repeats() {
        let names = vec!["x".to_string(), "y".to_string()];
        assert_eq!(monomial_name(&names, &[0, 0, 1]), "x^2*y");
        assert_eq!(monomial_name(&names, &[1]), "y");
    }
}
