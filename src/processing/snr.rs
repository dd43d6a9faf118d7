// src/processing/snr.rs
//! Automatic signal-to-noise estimation for single traces and stacks
//!
//! The noise region is the contiguous window of `noise_count` samples with
//! the lowest mean, which lands on the flat baseline of an upward transient.
//! The peak region is the global maximum and one sample on either side.
//! Downward (Vm) recordings should be inverted first.

use crate::config::constants::metrics;
use crate::error::{AnalysisErrorBuilder, AnalysisResult, ErrorKind, ProcessingStage};
use crate::types::Sample;
use crate::utils::{finite_samples, mean, sample_std, validate_non_empty};
use ndarray::{Array2, ArrayView1, ArrayView3, Axis, Zip};
use std::ops::Range;
use tracing::{debug, warn};

/// Diagnostics of one SNR estimate
#[derive(Debug, Clone, PartialEq)]
pub struct SnrResult {
    /// `peak_peak / sd_noise`, infinite for a noise-free baseline
    pub snr: f64,
    /// RMS level of the (noise, peak) regions
    pub rms_bounds: (f64, f64),
    pub peak_peak: f64,
    /// Sample standard deviation of the noise region
    pub sd_noise: f64,
    pub noise_region: Range<usize>,
    pub peak_region: Range<usize>,
    pub peak_index: usize,
}

/// Estimate the SNR of a single trace.
///
/// `noise_count` must lie in `1..=len / 2`. A trace whose peak cannot be told
/// apart from its noise (including a constant trace) is a degenerate-input
/// failure.
pub fn calculate_snr<T: Sample>(signal: ArrayView1<'_, T>, noise_count: usize) -> AnalysisResult<SnrResult> {
    validate_non_empty("snr", "signal", signal.len())?;
    validate_noise_count(noise_count, signal.len())?;
    let values = finite_samples("snr", "signal", signal)?;

    let noise_region = quietest_window(&values, noise_count);
    let peak_index = values
        .iter()
        .enumerate()
        .fold(0, |best, (i, &v)| if v > values[best] { i } else { best });
    let peak_region = peak_index.saturating_sub(metrics::PEAK_HALF_WIDTH)
        ..(peak_index + metrics::PEAK_HALF_WIDTH + 1).min(values.len());

    if peak_region.start < noise_region.end && noise_region.start < peak_region.end {
        return Err(AnalysisErrorBuilder::new("snr", "calculate_snr")
            .degenerate(ProcessingStage::Metrics, "peak region overlaps the noise region; signal too flat"));
    }

    let noise = &values[noise_region.clone()];
    let noise_rms = mean(noise).abs();
    let peak_rms = mean(&values[peak_region.clone()]).abs();
    let peak_peak = peak_rms - noise_rms;
    let sd_noise = sample_std(noise);

    if peak_peak <= sd_noise {
        return Err(AnalysisErrorBuilder::new("snr", "calculate_snr")
            .degenerate(ProcessingStage::Metrics, "peak is indistinguishable from noise"));
    }

    let snr = if sd_noise == 0.0 { f64::INFINITY } else { peak_peak / sd_noise };

    Ok(SnrResult {
        snr,
        rms_bounds: (noise_rms, peak_rms),
        peak_peak,
        sd_noise,
        noise_region,
        peak_region,
        peak_index,
    })
}

/// [`calculate_snr`] with the default noise window
pub fn calculate_snr_default<T: Sample>(signal: ArrayView1<'_, T>) -> AnalysisResult<SnrResult> {
    calculate_snr(signal, metrics::DEFAULT_NOISE_COUNT)
}

/// Per-pixel SNR of a (frame, row, column) stack, computed in parallel.
///
/// Pixels whose trace is degenerate map to NaN; any other failure aborts the
/// whole map.
pub fn map_snr<T: Sample>(stack: ArrayView3<'_, T>, noise_count: usize) -> AnalysisResult<Array2<f64>> {
    let (frames, rows, cols) = stack.dim();
    validate_noise_count(noise_count, frames)?;
    debug!(frames, rows, cols, noise_count, "mapping SNR");

    let results = Zip::indexed(stack.lanes(Axis(0))).par_map_collect(|(row, col), trace| {
        match calculate_snr(trace, noise_count) {
            Ok(result) => Ok(result.snr),
            Err(err) if err.kind() == ErrorKind::Degenerate => Ok(f64::NAN),
            Err(err) => Err(err.with_info("pixel", format!("({}, {})", row, col))),
        }
    });

    if let Some(err) = results.iter().find_map(|r| r.as_ref().err()) {
        return Err(err.clone());
    }

    let map = results.mapv(|r| r.unwrap_or(f64::NAN));
    let degenerate = map.iter().filter(|v| v.is_nan()).count();
    if degenerate > 0 {
        warn!(degenerate, pixels = rows * cols, "degenerate pixels in SNR map");
    }
    Ok(map)
}

fn validate_noise_count(noise_count: usize, len: usize) -> AnalysisResult<()> {
    if noise_count == 0 || noise_count > len / 2 {
        return Err(AnalysisErrorBuilder::new("snr", "validate_noise_count")
            .invalid_value("noise_count", "noise window must be positive and at most half the signal")
            .with_values(format!("[1, {}]", len / 2), noise_count));
    }
    Ok(())
}

/// Window of `count` samples with the lowest mean; the earliest wins ties
fn quietest_window(values: &[f64], count: usize) -> Range<usize> {
    let mut sum: f64 = values[..count].iter().sum();
    let (mut best_sum, mut best_start) = (sum, 0);
    for start in 1..=values.len() - count {
        sum += values[start + count - 1] - values[start - 1];
        if sum < best_sum {
            best_sum = sum;
            best_start = start;
        }
    }
    best_start..best_start + count
}
