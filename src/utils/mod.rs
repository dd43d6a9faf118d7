// src/utils/mod.rs
//! Common utility functions for the analysis core
//!
//! - Parameter validation mapped onto the [`crate::error::AnalysisError`] taxonomy
//! - Descriptive statistics used by the metrics and drift modules

pub mod stats;
pub mod validation;

pub use stats::{mean, median, min_max, rms, sample_std};
pub use validation::{
    finite_samples,
    validate_finite,
    validate_kernel_size,
    validate_non_empty,
    validate_positive,
    validate_range,
};
