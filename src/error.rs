//! Error types.
//!
//! - `RegressionError`: contract violations raised by the regression engine.
//! - `AppError`: what the `rlsq` binary reports (message + process exit code).

use thiserror::Error;

/// Failure modes of the regression engine.
///
/// All of these are raised at the point of violation; the engine never retries
/// or returns a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegressionError {
    /// A supplied matrix/vector disagrees with the expected `N` or `Features`.
    #[error("mismatch size: {what} has length {actual}, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A scalar argument is outside its valid range.
    #[error("argument out of range: {name}={value}")]
    OutOfRange { name: &'static str, value: f64 },

    /// Weights must be finite and nonnegative.
    #[error("invalid weight at index {index}: {value}")]
    InvalidWeights { index: usize, value: f64 },

    /// The normal equations could not be solved (rank-deficient design).
    #[error("normal equations are singular; the design matrix is rank deficient")]
    Singular,

    /// No feature columns were supplied.
    #[error("no feature columns supplied")]
    Empty,
}

/// Exit code for unusable input: bad flags, unreadable files, malformed data.
pub const EXIT_INPUT: u8 = 2;
/// Exit code for a regression that could not be carried out.
pub const EXIT_FIT: u8 = 3;

/// Error reported by the `rlsq` binary: a message for stderr plus the
/// process exit code.
#[derive(Debug, Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// An input/usage error (`EXIT_INPUT`).
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

impl From<RegressionError> for AppError {
    fn from(err: RegressionError) -> Self {
        AppError::new(EXIT_FIT, format!("Regression failed: {err}"))
    }
}
