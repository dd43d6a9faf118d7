// src/processing/filters/spatial.rs
//! Per-frame spatial smoothing
//!
//! All kernels are square with an odd edge length. Borders reflect about the
//! edge pixel without repeating it (`dcb|abcd|cba`).

use super::SpatialKernel;
use crate::error::{AnalysisErrorBuilder, AnalysisResult};
use crate::types::Sample;
use crate::utils::{median, validate_kernel_size};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;
use tracing::debug;

/// Smooth one frame. The result has the shape and dtype of the input.
pub fn filter_spatial<T: Sample>(
    frame: ArrayView2<'_, T>,
    kernel: SpatialKernel,
    size: usize,
) -> AnalysisResult<Array2<T>> {
    validate_kernel_size(size)?;
    validate_frame(frame.dim())?;
    Ok(smooth(frame, kernel, size))
}

/// [`filter_spatial`] with the kernel looked up by registry name
pub fn filter_spatial_named<T: Sample>(
    frame: ArrayView2<'_, T>,
    filter_type: &str,
    size: usize,
) -> AnalysisResult<Array2<T>> {
    let kernel: SpatialKernel = filter_type.parse()?;
    filter_spatial(frame, kernel, size)
}

/// Smooth every frame of a (frame, row, column) stack in parallel
pub fn filter_stack_spatial<T: Sample>(
    stack: ArrayView3<'_, T>,
    kernel: SpatialKernel,
    size: usize,
) -> AnalysisResult<Array3<T>> {
    validate_kernel_size(size)?;
    let (frames, rows, cols) = stack.dim();
    if frames > 0 {
        validate_frame((rows, cols))?;
    }
    debug!(frames, rows, cols, %kernel, size, "spatial filtering stack");

    let mut filtered = Array3::from_elem(stack.dim(), T::from_f64(0.0));
    filtered
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(stack.axis_iter(Axis(0)).into_par_iter())
        .for_each(|(mut out, frame)| out.assign(&smooth(frame, kernel, size)));

    Ok(filtered)
}

/// Gaussian standard deviation derived from the kernel size
pub fn gaussian_sigma(size: usize) -> f64 {
    0.3 * ((size as f64 - 1.0) / 2.0 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian weights
pub fn gaussian_weights(size: usize) -> Vec<f64> {
    let sigma = gaussian_sigma(size);
    let radius = (size / 2) as f64;
    let raw: Vec<f64> = (0..size)
        .map(|k| {
            let x = k as f64 - radius;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

fn validate_frame((rows, cols): (usize, usize)) -> AnalysisResult<()> {
    if rows == 0 || cols == 0 {
        return Err(AnalysisErrorBuilder::new("spatial", "filter_spatial")
            .invalid_value("frame", "frame must have at least one row and column")
            .with_values("non-empty", format!("{} x {}", rows, cols)));
    }
    Ok(())
}

fn smooth<T: Sample>(frame: ArrayView2<'_, T>, kernel: SpatialKernel, size: usize) -> Array2<T> {
    let values = frame.mapv(Sample::to_f64);
    let smoothed = match kernel {
        SpatialKernel::Gaussian => convolve_separable(&values, &gaussian_weights(size)),
        SpatialKernel::Mean => convolve_separable(&values, &vec![1.0 / size as f64; size]),
        SpatialKernel::Median => median_filter(&values, size),
    };
    smoothed.mapv(T::from_f64)
}

fn reflect101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let folded = index.rem_euclid(period);
    if folded >= len as isize {
        (period - folded) as usize
    } else {
        folded as usize
    }
}

fn convolve_separable(frame: &Array2<f64>, weights: &[f64]) -> Array2<f64> {
    let (rows, cols) = frame.dim();
    let radius = (weights.len() / 2) as isize;

    let horizontal = Array2::from_shape_fn((rows, cols), |(r, c)| {
        weights
            .iter()
            .enumerate()
            .map(|(k, w)| w * frame[[r, reflect101(c as isize + k as isize - radius, cols)]])
            .sum::<f64>()
    });

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        weights
            .iter()
            .enumerate()
            .map(|(k, w)| w * horizontal[[reflect101(r as isize + k as isize - radius, rows), c]])
            .sum::<f64>()
    })
}

fn median_filter(frame: &Array2<f64>, size: usize) -> Array2<f64> {
    let (rows, cols) = frame.dim();
    let radius = (size / 2) as isize;
    let mut window = Vec::with_capacity(size * size);

    let mut out = Array2::zeros((rows, cols));
    for ((r, c), slot) in out.indexed_iter_mut() {
        window.clear();
        for dr in -radius..=radius {
            let rr = reflect101(r as isize + dr, rows);
            for dc in -radius..=radius {
                window.push(frame[[rr, reflect101(c as isize + dc, cols)]]);
            }
        }
        *slot = median(&window);
    }
    out
}
