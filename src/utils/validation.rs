// src/utils/validation.rs
//! Validation helpers shared by the analysis entry points
//!
//! Every public operation validates before computing. These helpers map each
//! failed check to the matching [`AnalysisError`] kind so the call sites stay
//! one line each.

use crate::config::constants::spatial;
use crate::error::{AnalysisError, AnalysisErrorBuilder, AnalysisResult};
use crate::types::Sample;
use ndarray::ArrayView1;
use std::ops::RangeInclusive;

/// Reject NaN and infinities as invalid-type failures
pub fn validate_finite(component: &str, parameter: &str, value: f64) -> AnalysisResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisErrorBuilder::new(component, "validate")
            .invalid_type(parameter, &format!("expected a finite number, got {}", value)))
    }
}

/// Check that a finite value lies in an inclusive range
pub fn validate_range<T>(component: &str, parameter: &str, value: T, range: RangeInclusive<T>) -> AnalysisResult<T>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(out_of_range(component, parameter, &value, range.start(), range.end()))
    }
}

/// Check that a value is strictly positive
pub fn validate_positive(component: &str, parameter: &str, value: f64) -> AnalysisResult<f64> {
    let value = validate_finite(component, parameter, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(AnalysisErrorBuilder::new(component, "validate")
            .invalid_value(parameter, "must be positive")
            .with_values("> 0", value))
    }
}

/// Spatial kernel sizes must be odd and at least 3
pub fn validate_kernel_size(size: usize) -> AnalysisResult<usize> {
    if size >= spatial::MIN_KERNEL_SIZE && size % 2 == 1 {
        Ok(size)
    } else {
        Err(AnalysisErrorBuilder::new("spatial", "validate_kernel_size")
            .invalid_value("kernel_size", "must be an odd integer >= 3")
            .with_values(format!(">= {}, odd", spatial::MIN_KERNEL_SIZE), size))
    }
}

/// Reject empty inputs
pub fn validate_non_empty(component: &str, parameter: &str, len: usize) -> AnalysisResult<usize> {
    if len > 0 {
        Ok(len)
    } else {
        Err(AnalysisErrorBuilder::new(component, "validate")
            .invalid_value(parameter, "input must not be empty"))
    }
}

/// Widen samples to `f64`, rejecting NaN and infinities as invalid-type
pub fn finite_samples<T: Sample>(component: &str, parameter: &str, signal: ArrayView1<'_, T>) -> AnalysisResult<Vec<f64>> {
    let values: Vec<f64> = signal.iter().map(|v| v.to_f64()).collect();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisErrorBuilder::new(component, "validate")
            .invalid_type(parameter, "samples must be finite numbers"));
    }
    Ok(values)
}

fn out_of_range<T: std::fmt::Display>(component: &str, parameter: &str, value: &T, min: &T, max: &T) -> AnalysisError {
    AnalysisErrorBuilder::new(component, "validate")
        .invalid_value(parameter, "value out of range")
        .with_values(format!("[{}, {}]", min, max), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_validate_finite() {
        assert_eq!(validate_finite("t", "x", 1.5).unwrap(), 1.5);
        assert_eq!(validate_finite("t", "x", f64::NAN).unwrap_err().kind(), ErrorKind::InvalidType);
        assert_eq!(validate_finite("t", "x", f64::INFINITY).unwrap_err().kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("t", "order", 3u8, 1..=5).is_ok());
        let err = validate_range("t", "order", 6u8, 1..=5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(err.to_string().contains("[1, 5]"));
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("t", "fps", 500.0).is_ok());
        assert_eq!(validate_positive("t", "fps", 0.0).unwrap_err().kind(), ErrorKind::InvalidValue);
        assert_eq!(validate_positive("t", "fps", f64::NAN).unwrap_err().kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_validate_kernel_size() {
        assert!(validate_kernel_size(3).is_ok());
        assert!(validate_kernel_size(5).is_ok());
        for size in [0, 1, 2, 4, 8] {
            assert_eq!(validate_kernel_size(size).unwrap_err().kind(), ErrorKind::InvalidValue);
        }
    }

    #[test]
    fn test_finite_samples() {
        let values = ndarray::array![1u16, 2, 3];
        assert_eq!(finite_samples("t", "signal", values.view()).unwrap(), vec![1.0, 2.0, 3.0]);
        let values = ndarray::array![1.0, f64::NAN];
        let err = finite_samples("t", "signal", values.view()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("t", "signal", 1).is_ok());
        assert!(validate_non_empty("t", "signal", 0).is_err());
    }
}
