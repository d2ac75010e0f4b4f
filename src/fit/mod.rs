//! Least-squares fitting engines.
//!
//! - `Regressor`: ordinary and weighted least squares over a fixed design
//! - `RobustRegressor`: biweight IRLS on top of the same solve primitive

pub mod regressor;
pub mod robust;

pub use regressor::*;
pub use robust::*;
