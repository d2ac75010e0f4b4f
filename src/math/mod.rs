//! Mathematical utilities: normal-equation solver, order statistics, and
//! element-wise feature expansion.

pub mod expand;
pub mod ols;
pub mod stats;

pub use expand::*;
pub use ols::*;
pub use stats::*;
