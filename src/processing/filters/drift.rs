// src/processing/filters/drift.rs
//! Baseline drift removal
//!
//! A smooth trend is fitted to the whole trace and subtracted after removing
//! its own offset, so the corrected trace keeps the level of the drift's
//! minimum and the transient keeps its amplitude.

use super::DriftOrder;
use crate::config::constants::drift;
use crate::error::{AnalysisErrorBuilder, AnalysisResult, ProcessingStage};
use crate::types::Sample;
use crate::utils::{finite_samples, min_max, validate_non_empty, validate_range};
use ndarray::{Array1, ArrayView1};
use tracing::{debug, trace};

/// Fit and remove drift. Returns the corrected trace in the input dtype and
/// the fitted drift curve.
pub fn filter_drift<T: Sample>(
    signal: ArrayView1<'_, T>,
    order: DriftOrder,
) -> AnalysisResult<(Array1<T>, Array1<f64>)> {
    validate_non_empty("drift", "signal", signal.len())?;
    let values = finite_samples("drift", "signal", signal)?;

    let fitted = match order {
        DriftOrder::Polynomial(degree) => {
            validate_range("drift", "drift_order", degree, drift::MIN_POLY_ORDER..=drift::MAX_POLY_ORDER)?;
            require_samples(values.len(), degree as usize + 1)?;
            fit_polynomial(&values, degree as usize)?
        }
        DriftOrder::Exponential => {
            require_samples(values.len(), 3)?;
            fit_exponential(&values)?
        }
    };
    debug!(samples = values.len(), ?order, "drift fitted");

    let (offset, _) = min_max(&fitted);
    let corrected = values
        .iter()
        .zip(&fitted)
        .map(|(v, d)| T::from_f64(v - (d - offset)))
        .collect::<Array1<T>>();

    Ok((corrected, Array1::from(fitted)))
}

fn require_samples(len: usize, needed: usize) -> AnalysisResult<()> {
    if len < needed {
        return Err(AnalysisErrorBuilder::new("drift", "filter_drift")
            .invalid_value("signal", "signal too short for the drift model")
            .with_values(format!(">= {} samples", needed), len));
    }
    Ok(())
}

/// Abscissa scaled onto [-1, 1] to keep the normal equations well conditioned
fn scaled_abscissa(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![0.0];
    }
    (0..len).map(|i| 2.0 * i as f64 / (len - 1) as f64 - 1.0).collect()
}

fn fit_polynomial(values: &[f64], degree: usize) -> AnalysisResult<Vec<f64>> {
    let x = scaled_abscissa(values.len());
    let terms = degree + 1;

    // normal equations: (V^T V) c = V^T y
    let mut power_sums = vec![0.0; 2 * degree + 1];
    let mut rhs = vec![0.0; terms];
    for (&xi, &yi) in x.iter().zip(values) {
        let mut p = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += p;
            if k < terms {
                rhs[k] += p * yi;
            }
            p *= xi;
        }
    }
    let mut matrix: Vec<Vec<f64>> = (0..terms)
        .map(|j| (0..terms).map(|k| power_sums[j + k]).collect())
        .collect();

    let coefficients = solve_linear(&mut matrix, &mut rhs)?;
    trace!(?coefficients, "polynomial drift coefficients");

    Ok(x.iter()
        .map(|&xi| coefficients.iter().rev().fold(0.0, |acc, c| acc * xi + c))
        .collect())
}

/// Gaussian elimination with partial pivoting
fn solve_linear(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> AnalysisResult<Vec<f64>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot][col].abs() < 1e-12 {
            return Err(AnalysisErrorBuilder::new("drift", "fit_polynomial")
                .degenerate(ProcessingStage::DriftRemoval, "normal equations are singular"));
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Ok(solution)
}

/// Least-squares `A * exp(-B t) + C` on t in [0, 1]
struct ExpFit {
    rate: f64,
    amplitude: f64,
    offset: f64,
    sse: f64,
}

fn fit_exponential(values: &[f64]) -> AnalysisResult<Vec<f64>> {
    let n = values.len();
    let t: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();

    let log_min = drift::EXP_RATE_MIN.ln();
    let step = (drift::EXP_RATE_MAX.ln() - log_min) / (drift::EXP_GRID_POINTS - 1) as f64;
    let log_rate = |k: usize| log_min + step * k as f64;

    let mut best: Option<(ExpFit, f64, usize)> = None;
    for sign in [1.0, -1.0] {
        for k in 0..drift::EXP_GRID_POINTS {
            if let Some(fit) = fit_for_rate(&t, values, sign * log_rate(k).exp()) {
                if best.as_ref().map_or(true, |(b, _, _)| fit.sse < b.sse) {
                    best = Some((fit, sign, k));
                }
            }
        }
    }

    let (grid_fit, sign, k) = best.ok_or_else(|| {
        AnalysisErrorBuilder::new("drift", "fit_exponential")
            .degenerate(ProcessingStage::DriftRemoval, "no exponential model fits the signal")
    })?;

    // golden-section refinement of log|B| between the neighbouring grid points
    let golden = (5f64.sqrt() - 1.0) / 2.0;
    let sse_at = |log_b: f64| fit_for_rate(&t, values, sign * log_b.exp()).map_or(f64::INFINITY, |f| f.sse);
    let (mut lo, mut hi) = (log_rate(k.saturating_sub(1)), log_rate((k + 1).min(drift::EXP_GRID_POINTS - 1)));
    let mut a = hi - golden * (hi - lo);
    let mut b = lo + golden * (hi - lo);
    let (mut fa, mut fb) = (sse_at(a), sse_at(b));
    for _ in 0..drift::EXP_REFINE_ITERATIONS {
        if fa < fb {
            hi = b;
            b = a;
            fb = fa;
            a = hi - golden * (hi - lo);
            fa = sse_at(a);
        } else {
            lo = a;
            a = b;
            fa = fb;
            b = lo + golden * (hi - lo);
            fb = sse_at(b);
        }
    }

    let fit = match fit_for_rate(&t, values, sign * ((lo + hi) / 2.0).exp()) {
        Some(refined) if refined.sse <= grid_fit.sse => refined,
        _ => grid_fit,
    };
    trace!(rate = fit.rate, amplitude = fit.amplitude, offset = fit.offset, "exponential drift");

    Ok(t.iter()
        .map(|&ti| fit.amplitude * (-fit.rate * ti).exp() + fit.offset)
        .collect())
}

/// Closed-form A and C for a fixed rate; None when the basis is degenerate
fn fit_for_rate(t: &[f64], values: &[f64], rate: f64) -> Option<ExpFit> {
    let n = t.len() as f64;
    let basis: Vec<f64> = t.iter().map(|&ti| (-rate * ti).exp()).collect();
    let (mut se, mut see, mut sy, mut sey) = (0.0, 0.0, 0.0, 0.0);
    for (&e, &y) in basis.iter().zip(values) {
        se += e;
        see += e * e;
        sy += y;
        sey += e * y;
    }

    let det = n * see - se * se;
    if !det.is_finite() || det.abs() <= 1e-12 * n * see {
        return None;
    }
    let amplitude = (n * sey - se * sy) / det;
    let offset = (sy - amplitude * se) / n;
    let sse = basis
        .iter()
        .zip(values)
        .map(|(&e, &y)| {
            let r = y - (amplitude * e + offset);
            r * r
        })
        .sum::<f64>();

    sse.is_finite().then_some(ExpFit { rate, amplitude, offset, sse })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_quadratic_drift_removed() {
        let signal = Array1::from_shape_fn(101, |i| 100.0 + 0.01 * (i as f64 - 30.0).powi(2));
        let (corrected, drift) = filter_drift(signal.view(), DriftOrder::Polynomial(2)).unwrap();

        for (d, s) in drift.iter().zip(signal.iter()) {
            assert!((d - s).abs() < 1e-8);
        }
        for v in corrected.iter() {
            assert!((v - 100.0).abs() < 1e-8);
        }
    }

    #[test]
    fn test_linear_drift_under_integer_signal() {
        let signal = Array1::from_shape_fn(200, |i| (500 + i / 2) as u16);
        let (corrected, drift) = filter_drift(signal.view(), DriftOrder::Polynomial(1)).unwrap();
        assert_eq!(drift.len(), 200);
        let (lo, hi) = corrected.iter().fold((u16::MAX, 0), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        assert!(hi - lo <= 1);
    }

    #[test]
    fn test_exponential_drift_recovered() {
        let n = 300;
        let signal = Array1::from_shape_fn(n, |i| {
            let t = i as f64 / (n - 1) as f64;
            50.0 * (-3.0 * t).exp() + 100.0
        });
        let (corrected, drift) = filter_drift(signal.view(), DriftOrder::Exponential).unwrap();

        for (d, s) in drift.iter().zip(signal.iter()) {
            assert!((d - s).abs() < 1e-6);
        }
        let floor = drift.iter().cloned().fold(f64::INFINITY, f64::min);
        for v in corrected.iter() {
            assert!((v - floor).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rising_exponential() {
        let n = 120;
        let signal = Array1::from_shape_fn(n, |i| {
            let t = i as f64 / (n - 1) as f64;
            10.0 * (1.5 * t).exp() + 20.0
        });
        let (_, drift) = filter_drift(signal.view(), DriftOrder::Exponential).unwrap();
        for (d, s) in drift.iter().zip(signal.iter()) {
            assert!((d - s).abs() < 1e-6);
        }
    }

    #[test]
    fn test_invalid_orders() {
        let signal = Array1::from_elem(50, 10.0);
        for order in [DriftOrder::Polynomial(0), DriftOrder::Polynomial(6), DriftOrder::Polynomial(u8::MAX)] {
            let err = filter_drift(signal.view(), order).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidValue);
            assert!(err.to_string().contains("expected: [1, 5]"), "{}", err);
        }

        let short = Array1::from_elem(4, 10.0);
        let err = filter_drift(short.view(), DriftOrder::Polynomial(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);

        let with_nan = Array1::from_vec(vec![1.0, f64::NAN, 3.0]);
        let err = filter_drift(with_nan.view(), DriftOrder::Polynomial(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_constant_signal_has_flat_drift() {
        let signal = Array1::from_elem(64, 42u16);
        for order in [DriftOrder::Polynomial(3), DriftOrder::Exponential] {
            let (corrected, drift) = filter_drift(signal.view(), order).unwrap();
            assert!(corrected.iter().all(|&v| v == 42));
            assert!(drift.iter().all(|d| (d - 42.0).abs() < 1e-6));
        }
    }
}
