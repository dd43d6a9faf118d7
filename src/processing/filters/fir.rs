// src/processing/filters/fir.rs
//! Linear-phase FIR low-pass design (windowed sinc)

use super::FilterOrder;
use crate::config::constants::temporal;
use crate::error::{AnalysisErrorBuilder, AnalysisResult, ProcessingStage};
use rustfft::{num_complex::Complex64, FftPlanner};
use std::f64::consts::PI;
use tracing::trace;

/// Symmetric FIR low-pass filter with unity DC gain
#[derive(Debug, Clone, PartialEq)]
pub struct FirFilter {
    coefficients: Vec<f64>,
}

impl FirFilter {
    /// Wrap existing coefficients; they must be non-empty and symmetric
    pub fn new(coefficients: Vec<f64>) -> AnalysisResult<Self> {
        if coefficients.is_empty() {
            return Err(AnalysisErrorBuilder::new("fir", "new")
                .invalid_value("coefficients", "empty coefficients"));
        }
        check_symmetry(&coefficients)?;
        Ok(Self { coefficients })
    }

    /// Design a low-pass filter for `cutoff` Hz at `sample_rate` Hz.
    ///
    /// An explicit order `n` yields `n + 1` taps with a Hamming window. The
    /// automatic order comes from Kaiser's estimate for `ripple_db` of
    /// stopband attenuation across `transition_hz`, with a Kaiser window.
    /// Tap counts are rounded up to odd so the group delay is a whole number
    /// of samples.
    pub fn design(
        sample_rate: f64,
        cutoff: f64,
        order: FilterOrder,
        ripple_db: f64,
        transition_hz: f64,
    ) -> AnalysisResult<Self> {
        match order {
            FilterOrder::Explicit(0) => Err(AnalysisErrorBuilder::new("fir", "design")
                .invalid_value("filter_order", "must be a positive integer")
                .with_values("> 0", 0)),
            FilterOrder::Explicit(n) => {
                let window = hamming_window(bounded_taps("filter_order", n.checked_add(1))?);
                Self::lowpass_windowed_sinc(cutoff, sample_rate, &window)
            }
            FilterOrder::Auto => {
                if !(ripple_db >= temporal::MIN_RIPPLE_DB) {
                    return Err(AnalysisErrorBuilder::new("fir", "design")
                        .invalid_value("ripple_db", "attenuation too small for Kaiser's order estimate")
                        .with_values(format!(">= {}", temporal::MIN_RIPPLE_DB), ripple_db));
                }
                if !(transition_hz > 0.0 && transition_hz.is_finite()) {
                    return Err(AnalysisErrorBuilder::new("fir", "design")
                        .invalid_value("transition_hz", "transition width must be positive")
                        .with_values("> 0", transition_hz));
                }
                let nyquist = sample_rate / 2.0;
                let (numtaps, beta) = kaiserord(ripple_db, transition_hz / nyquist);
                let window = kaiser_window(bounded_taps("transition_hz", Some(numtaps))?, beta);
                Self::lowpass_windowed_sinc(cutoff, sample_rate, &window)
            }
        }
    }

    /// Windowed-sinc low-pass over an odd-length window. Half the taps are
    /// computed and mirrored, then scaled to unity DC gain.
    pub fn lowpass_windowed_sinc(cutoff: f64, sample_rate: f64, window: &[f64]) -> AnalysisResult<Self> {
        let length = window.len();
        if length % 2 == 0 {
            return Err(AnalysisErrorBuilder::new("fir", "lowpass_windowed_sinc")
                .invalid_value("length", "length must be odd")
                .with_values("odd", length));
        }
        if !(cutoff > 0.0 && cutoff < sample_rate / 2.0) {
            return Err(AnalysisErrorBuilder::new("fir", "lowpass_windowed_sinc")
                .invalid_value("cutoff", "cutoff must lie between 0 and the Nyquist frequency")
                .with_values(format!("(0, {})", sample_rate / 2.0), cutoff));
        }

        let fc = cutoff / sample_rate;
        let m = (length - 1) / 2;
        let mut coefficients = vec![0.0; length];

        for i in 0..=m {
            let n = i as f64 - m as f64;
            let sinc = if i == m {
                2.0 * fc
            } else {
                (2.0 * PI * fc * n).sin() / (PI * n)
            };
            coefficients[i] = sinc * window[i];
            coefficients[length - 1 - i] = coefficients[i];
        }

        let gain: f64 = coefficients.iter().sum();
        if gain == 0.0 || !gain.is_finite() {
            return Err(AnalysisErrorBuilder::new("fir", "lowpass_windowed_sinc")
                .integrity(ProcessingStage::TemporalFiltering, "filter has no DC gain to normalize"));
        }
        coefficients.iter_mut().for_each(|c| *c /= gain);

        trace!(taps = length, cutoff, sample_rate, "designed FIR low-pass");
        Self::new(coefficients)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn length(&self) -> usize {
        self.coefficients.len()
    }

    /// Group delay in samples
    pub fn delay(&self) -> usize {
        (self.coefficients.len() - 1) / 2
    }

    /// Centred convolution; the ends are padded with the first and last
    /// samples so the output has the input's length and no time shift.
    pub fn apply_zero_phase(&self, signal: &[f64]) -> Vec<f64> {
        let len = signal.len();
        if len == 0 {
            return Vec::new();
        }
        let half = self.delay() as isize;
        let last = len as isize - 1;

        (0..len as isize)
            .map(|i| {
                self.coefficients
                    .iter()
                    .enumerate()
                    .map(|(k, c)| {
                        let idx = (i + k as isize - half).clamp(0, last) as usize;
                        c * signal[idx]
                    })
                    .sum()
            })
            .collect()
    }

    /// Magnitude response at `points` evenly spaced frequencies from DC to
    /// Nyquist, as (frequency Hz, gain) pairs
    pub fn frequency_response(&self, points: usize, sample_rate: f64) -> Vec<(f64, f64)> {
        if points == 0 {
            return Vec::new();
        }
        let fft_len = (2 * (points - 1)).max(self.length()).max(2);
        let mut buffer: Vec<Complex64> = self
            .coefficients
            .iter()
            .map(|&c| Complex64::new(c, 0.0))
            .collect();
        buffer.resize(fft_len, Complex64::new(0.0, 0.0));

        let mut planner = FftPlanner::new();
        planner.plan_fft_forward(fft_len).process(&mut buffer);

        let nyquist = sample_rate / 2.0;
        (0..points)
            .map(|p| {
                let frequency = if points == 1 { 0.0 } else { nyquist * p as f64 / (points - 1) as f64 };
                let bin = ((frequency / sample_rate) * fft_len as f64).round() as usize;
                (frequency, buffer[bin.min(fft_len - 1)].norm())
            })
            .collect()
    }
}

fn make_odd(taps: usize) -> usize {
    if taps % 2 == 0 {
        taps + 1
    } else {
        taps
    }
}

/// Odd tap count within the design cap; `None` is an overflowed count
fn bounded_taps(parameter: &str, taps: Option<usize>) -> AnalysisResult<usize> {
    match taps.map(make_odd) {
        Some(taps) if taps <= temporal::MAX_FILTER_TAPS => Ok(taps),
        other => Err(AnalysisErrorBuilder::new("fir", "design")
            .invalid_value(parameter, "filter would exceed the maximum tap count")
            .with_values(
                format!("<= {} taps", temporal::MAX_FILTER_TAPS),
                other.map_or_else(|| "overflow".to_string(), |taps| taps.to_string()),
            )),
    }
}

/// Coefficients must equal their own reverse
fn check_symmetry(coefficients: &[f64]) -> AnalysisResult<()> {
    let asymmetric = coefficients
        .iter()
        .zip(coefficients.iter().rev())
        .any(|(a, b)| (a - b).abs() > temporal::SYMMETRY_TOLERANCE);
    if asymmetric {
        return Err(AnalysisErrorBuilder::new("fir", "check_symmetry")
            .integrity(ProcessingStage::TemporalFiltering, "filter coefficients are not symmetric"));
    }
    Ok(())
}

pub fn hamming_window(length: usize) -> Vec<f64> {
    if length == 1 {
        return vec![1.0];
    }
    (0..length)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (length - 1) as f64).cos())
        .collect()
}

pub fn kaiser_window(length: usize, beta: f64) -> Vec<f64> {
    if length == 1 {
        return vec![1.0];
    }
    let i0_beta = modified_bessel_i0(beta);
    (0..length)
        .map(|i| {
            let n = 2.0 * i as f64 / (length - 1) as f64 - 1.0;
            let arg = beta * (1.0 - n * n).max(0.0).sqrt();
            modified_bessel_i0(arg) / i0_beta
        })
        .collect()
}

/// Kaiser window shape parameter for a stopband attenuation in dB
pub fn kaiser_beta(attenuation_db: f64) -> f64 {
    if attenuation_db > 50.0 {
        0.1102 * (attenuation_db - 8.7)
    } else if attenuation_db > 21.0 {
        0.5842 * (attenuation_db - 21.0).powf(0.4) + 0.07886 * (attenuation_db - 21.0)
    } else {
        0.0
    }
}

/// Kaiser's tap-count estimate. `width` is the transition band as a
/// fraction of the Nyquist frequency. Returns (taps, beta).
pub fn kaiserord(ripple_db: f64, width: f64) -> (usize, f64) {
    let taps = ((ripple_db - 7.95) / (2.285 * PI * width) + 1.0).ceil();
    (taps.max(1.0) as usize, kaiser_beta(ripple_db))
}

// Approximation of modified Bessel function I0
fn modified_bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 3.75 {
        let y = (x / 3.75).powi(2);
        1.0 + y * (3.5156229 + y * (3.0899424 + y * (1.2067492
            + y * (0.2659732 + y * (0.0360768 + y * 0.0045813)))))
    } else {
        let y = 3.75 / ax;
        (ax.exp() / ax.sqrt()) * (0.39894228 + y * (0.01328592
            + y * (0.00225319 + y * (-0.00157565 + y * (0.00916281
            + y * (-0.02057706 + y * (0.02635537 + y * (-0.01647633
            + y * 0.00392377))))))))
    }
}
