// src/processing/metrics.rs
//! Signal metrics: normalization, inversion, F/F0 and percent error

use crate::error::{AnalysisErrorBuilder, AnalysisResult, ProcessingStage};
use crate::types::Sample;
use crate::utils::{finite_samples, mean, median, min_max, sample_std, validate_finite, validate_non_empty};
use ndarray::{Array1, ArrayView1};

/// Percent error of a modified signal against its ideal reference
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResult {
    /// Elementwise `(modified - ideal) / ideal * 100`
    pub error: Array1<f64>,
    pub mean: f64,
    /// Sample standard deviation of `error`
    pub sd: f64,
}

/// Rescale to [0, 1] using the signal's own extrema
pub fn normalize<T: Sample>(signal: ArrayView1<'_, T>) -> AnalysisResult<Array1<f64>> {
    validate_non_empty("metrics", "signal", signal.len())?;
    let values = finite_samples("metrics", "signal", signal)?;
    let (lo, hi) = min_max(&values);
    let range = hi - lo;
    if range == 0.0 {
        return Err(AnalysisErrorBuilder::new("metrics", "normalize")
            .degenerate(ProcessingStage::Metrics, "a flat signal cannot be normalized"));
    }
    Ok(values.iter().map(|v| (v - lo) / range).collect())
}

/// Reflect about the midpoint of the signal's range (`max + min - x`).
/// The range is preserved and the transform is its own inverse.
pub fn invert<T: Sample>(signal: ArrayView1<'_, T>) -> AnalysisResult<Array1<T>> {
    validate_non_empty("metrics", "signal", signal.len())?;
    let values = finite_samples("metrics", "signal", signal)?;
    let (lo, hi) = min_max(&values);
    Ok(values.iter().map(|v| T::from_f64(hi + lo - v)).collect())
}

/// F/F0 with F0 estimated as the median of the signal
pub fn calc_ff0<T: Sample>(signal: ArrayView1<'_, T>) -> AnalysisResult<Array1<f64>> {
    validate_non_empty("metrics", "signal", signal.len())?;
    let values = finite_samples("metrics", "signal", signal)?;
    ratio(&values, median(&values))
}

/// F/F0 against a caller-supplied baseline
pub fn calc_ff0_with_baseline<T: Sample>(signal: ArrayView1<'_, T>, f0: f64) -> AnalysisResult<Array1<f64>> {
    validate_non_empty("metrics", "signal", signal.len())?;
    validate_finite("metrics", "f0", f0)?;
    let values = finite_samples("metrics", "signal", signal)?;
    ratio(&values, f0)
}

fn ratio(values: &[f64], f0: f64) -> AnalysisResult<Array1<f64>> {
    if f0 == 0.0 {
        return Err(AnalysisErrorBuilder::new("metrics", "calc_ff0")
            .degenerate(ProcessingStage::Metrics, "baseline fluorescence F0 is zero"));
    }
    Ok(values.iter().map(|v| v / f0).collect())
}

/// Percent error of `modified` relative to `ideal`, with its mean and
/// sample standard deviation
pub fn calculate_error<A: Sample, B: Sample>(
    ideal: ArrayView1<'_, A>,
    modified: ArrayView1<'_, B>,
) -> AnalysisResult<ErrorResult> {
    validate_non_empty("metrics", "ideal", ideal.len())?;
    if ideal.len() != modified.len() {
        return Err(AnalysisErrorBuilder::new("metrics", "calculate_error")
            .invalid_value("modified", "ideal and modified signals must have equal length")
            .with_values(ideal.len(), modified.len()));
    }
    let ideal = finite_samples("metrics", "ideal", ideal)?;
    let modified = finite_samples("metrics", "modified", modified)?;
    if ideal.iter().any(|&v| v == 0.0) {
        return Err(AnalysisErrorBuilder::new("metrics", "calculate_error")
            .degenerate(ProcessingStage::Metrics, "percent error is undefined where the ideal signal is zero"));
    }

    let error: Vec<f64> = ideal
        .iter()
        .zip(&modified)
        .map(|(i, m)| (m - i) / i * 100.0)
        .collect();

    Ok(ErrorResult {
        mean: mean(&error),
        sd: sample_std(&error),
        error: Array1::from(error),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::array;

    #[test]
    fn test_normalize() {
        let normalized = normalize(array![10u16, 20, 30].view()).unwrap();
        assert_eq!(normalized, array![0.0, 0.5, 1.0]);

        let err = normalize(array![5.0, 5.0, 5.0].view()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Degenerate);
    }

    #[test]
    fn test_invert_preserves_range() {
        let signal = array![100u16, 90, 95, 100];
        let inverted = invert(signal.view()).unwrap();
        assert_eq!(inverted, array![90u16, 100, 95, 90]);
        assert_eq!(invert(inverted.view()).unwrap(), signal);
    }

    #[test]
    fn test_calc_ff0() {
        let ratio = calc_ff0(array![100.0, 100.0, 150.0, 100.0, 90.0].view()).unwrap();
        assert_eq!(ratio[2], 1.5);
        assert_eq!(ratio[4], 0.9);

        let ratio = calc_ff0_with_baseline(array![50u16, 75].view(), 50.0).unwrap();
        assert_eq!(ratio, array![1.0, 1.5]);

        let err = calc_ff0(array![0.0, 0.0, 5.0].view()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Degenerate);
        let err = calc_ff0_with_baseline(array![1.0].view(), f64::NAN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_calculate_error() {
        let result = calculate_error(array![100.0, 200.0, 50.0].view(), array![110u16, 190, 50].view()).unwrap();
        assert_eq!(result.error.len(), 3);
        assert!((result.error[0] - 10.0).abs() < 1e-12);
        assert!((result.error[1] + 5.0).abs() < 1e-12);
        assert!((result.mean - 5.0 / 3.0).abs() < 1e-12);
        assert!(result.sd > 0.0);
    }

    #[test]
    fn test_calculate_error_validation() {
        let err = calculate_error(array![1.0, 2.0].view(), array![1.0].view()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        let err = calculate_error(array![0.0, 2.0].view(), array![1.0, 2.0].view()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Degenerate);
        let empty = Array1::<f64>::zeros(0);
        let err = calculate_error(empty.view(), empty.view()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
