//! `robust-lsq` library crate.
//!
//! Weighted and iteratively reweighted (biweight) linear least squares on
//! `nalgebra` matrices.
//!
//! The binary (`rlsq`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the regression engine (`fit`) is usable on its own, without the CSV/CLI layers

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;

pub use domain::Intercept;
pub use error::RegressionError;
pub use fit::{Regressor, RobustOptions, RobustRegressor};
