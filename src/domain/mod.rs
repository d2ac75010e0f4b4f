//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the intercept model (`Intercept`, `InterceptMode`)
//! - run configuration (`FitConfig`)
//! - fit outputs (`FitQuality`, `ResidualRow`, `ModelFile`)

pub mod types;

pub use types::*;
