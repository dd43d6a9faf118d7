// src/simulation/propagation.rs
//! Radial propagation of a transient across a synthetic image stack

use super::waveform::{model_transients, WaveformSpec};
use crate::config::constants::propagation;
use crate::error::{AnalysisErrorBuilder, AnalysisResult, ProcessingStage};
use crate::types::TransientType;
use crate::utils::{validate_finite, validate_positive};
use ndarray::{s, Array1, Array3};
use rayon::prelude::*;
use tracing::debug;

/// Stack synthesis parameters.
///
/// The waveform template supplies the transient type, timing, fluorescence
/// levels and base noise. Each pixel delays its onset by the conduction time
/// from the image centre and adds `noise_gradient * distance / max_distance`
/// percent of noise.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationSpec {
    pub waveform: WaveformSpec,
    pub height: usize,
    pub width: usize,
    pub velocity_cm_s: f64,
    pub pixel_size_cm: f64,
    pub noise_gradient: f64,
}

impl PropagationSpec {
    pub fn new(waveform: WaveformSpec) -> Self {
        Self {
            waveform,
            height: propagation::DEFAULT_HEIGHT,
            width: propagation::DEFAULT_WIDTH,
            velocity_cm_s: propagation::DEFAULT_VELOCITY_CM_S,
            pixel_size_cm: propagation::DEFAULT_PIXEL_SIZE_CM,
            noise_gradient: 0.0,
        }
    }

    /// Default 50 x 100 stack, 150 ms at 500 fps with onset at 15 ms
    pub fn default_for(model_type: TransientType) -> AnalysisResult<Self> {
        let waveform = WaveformSpec::builder(model_type)
            .duration_ms(propagation::DEFAULT_DURATION_MS)
            .onset_ms(propagation::DEFAULT_ONSET_MS)
            .fps(propagation::DEFAULT_FPS)
            .build()?;
        Ok(Self::new(waveform))
    }

    pub fn with_size(mut self, height: usize, width: usize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    pub fn with_velocity(mut self, velocity_cm_s: f64) -> Self {
        self.velocity_cm_s = velocity_cm_s;
        self
    }

    pub fn with_pixel_size(mut self, pixel_size_cm: f64) -> Self {
        self.pixel_size_cm = pixel_size_cm;
        self
    }

    pub fn with_noise_gradient(mut self, noise_gradient: f64) -> Self {
        self.noise_gradient = noise_gradient;
        self
    }

    fn centre(&self) -> (f64, f64) {
        ((self.height as f64 - 1.0) / 2.0, (self.width as f64 - 1.0) / 2.0)
    }

    /// Distance in pixels from the image centre
    pub fn distance(&self, row: usize, col: usize) -> f64 {
        let (cy, cx) = self.centre();
        (row as f64 - cy).hypot(col as f64 - cx)
    }

    /// Distance from the centre to a corner pixel
    pub fn max_distance(&self) -> f64 {
        let (cy, cx) = self.centre();
        cy.hypot(cx)
    }

    /// Onset of the first transient at a pixel, in ms
    pub fn pixel_onset_ms(&self, row: usize, col: usize) -> f64 {
        let delay_s = self.distance(row, col) * self.pixel_size_cm / self.velocity_cm_s;
        self.waveform.onset_ms() + delay_s * 1000.0
    }

    /// Noise percentage at a pixel
    pub fn pixel_noise(&self, row: usize, col: usize) -> f64 {
        let max_distance = self.max_distance();
        if max_distance == 0.0 {
            return self.waveform.noise();
        }
        self.waveform.noise() + self.noise_gradient * self.distance(row, col) / max_distance
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        let err = || AnalysisErrorBuilder::new("propagation", "validate");

        if self.height == 0 || self.width == 0 {
            return Err(err()
                .invalid_value("size", "stack dimensions must be non-zero")
                .with_values("> 0 x > 0", format!("{} x {}", self.height, self.width)));
        }
        validate_positive("propagation", "velocity_cm_s", self.velocity_cm_s)?;
        validate_positive("propagation", "pixel_size_cm", self.pixel_size_cm)?;
        validate_finite("propagation", "noise_gradient", self.noise_gradient)?;
        if self.noise_gradient < 0.0 {
            return Err(err()
                .invalid_value("noise_gradient", "noise gradient must be non-negative")
                .with_values(">= 0", self.noise_gradient));
        }

        let latest = self.waveform.onset_ms()
            + self.max_distance() * self.pixel_size_cm / self.velocity_cm_s * 1000.0;
        if latest >= self.waveform.duration_ms() {
            return Err(err()
                .invalid_value("velocity_cm_s", "the latest pixel onset falls after the end of the recording")
                .with_values(format!("< {} ms", self.waveform.duration_ms()), format!("{:.3} ms", latest)));
        }
        Ok(())
    }
}

/// Synthesize a (frame, row, column) stack of a transient propagating from
/// the image centre. Pixels are synthesized in parallel; with a seeded
/// template each pixel derives its own seed from its flat index.
pub fn model_stack_propagation(spec: &PropagationSpec) -> AnalysisResult<(Array1<f64>, Array3<f64>)> {
    spec.validate()?;

    let (height, width) = (spec.height, spec.width);
    let frames = spec.waveform.frame_count();
    debug!(height, width, frames, "synthesizing propagation stack");

    let traces = (0..height * width)
        .into_par_iter()
        .map(|idx| {
            let (row, col) = (idx / width, idx % width);
            let pixel = spec
                .waveform
                .with_onset(spec.pixel_onset_ms(row, col))
                .with_noise(spec.pixel_noise(row, col))
                .with_seed(spec.waveform.seed().map(|seed| seed.wrapping_add(idx as u64)));
            model_transients(&pixel)
        })
        .collect::<AnalysisResult<Vec<_>>>()?;

    let time = Array1::from_shape_fn(frames, |i| i as f64 * spec.waveform.frame_period_ms());
    let mut stack = Array3::zeros((frames, height, width));
    for (idx, trace) in traces.iter().enumerate() {
        if trace.len() != frames {
            return Err(AnalysisErrorBuilder::new("propagation", "model_stack_propagation")
                .integrity(ProcessingStage::Synthesis, "pixel trace length differs from the stack frame count"));
        }
        stack
            .slice_mut(s![.., idx / width, idx % width])
            .assign(trace.data());
    }

    Ok((time, stack))
}
