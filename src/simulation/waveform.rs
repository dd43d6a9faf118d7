// src/simulation/waveform.rs
//! Idealized optical transients embedded in a baseline recording
//!
//! A transient is assembled from three phases: a Gaussian-shaped upstroke,
//! a linear early repolarization to a fixed fraction of the peak (APD20 for
//! Vm, CAD40 for Ca) and an exponential late repolarization that fills the
//! rest of the transient. Samples are truncated to whole fluorescence counts
//! before noise is added to the whole recording.

use super::noise_models::NoiseModel;
use crate::config::constants::waveform::{self, ca, vm};
use crate::error::{AnalysisErrorBuilder, AnalysisResult, ProcessingStage};
use crate::types::{Signal, TransientType};
use crate::utils::validate_finite;
use ndarray::Array1;
use tracing::debug;

/// How many transients a recording carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientCount {
    /// Exactly `n` transients, clipped at the end of the recording
    Count(u32),
    /// As many transients as start before the end of the recording
    Full,
}

/// Validated synthesis parameters, see [`WaveformSpec::builder`]
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSpec {
    model_type: TransientType,
    duration_ms: f64,
    onset_ms: f64,
    fps: u32,
    baseline: u32,
    amplitude: i32,
    noise: f64,
    count: TransientCount,
    cycle_length_ms: f64,
    seed: Option<u64>,
}

/// Builder for [`WaveformSpec`]; every check runs in [`WaveformSpecBuilder::build`]
#[derive(Debug, Clone)]
pub struct WaveformSpecBuilder {
    spec: WaveformSpec,
}

impl WaveformSpec {
    pub fn builder(model_type: TransientType) -> WaveformSpecBuilder {
        WaveformSpecBuilder {
            spec: WaveformSpec {
                model_type,
                duration_ms: waveform::DEFAULT_DURATION_MS,
                onset_ms: waveform::DEFAULT_ONSET_MS,
                fps: waveform::DEFAULT_FPS,
                baseline: waveform::DEFAULT_BASELINE,
                amplitude: waveform::DEFAULT_AMPLITUDE,
                noise: 0.0,
                count: TransientCount::Count(1),
                cycle_length_ms: waveform::DEFAULT_CYCLE_LENGTH_MS,
                seed: None,
            },
        }
    }

    pub fn model_type(&self) -> TransientType {
        self.model_type
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn onset_ms(&self) -> f64 {
        self.onset_ms
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    pub fn amplitude(&self) -> i32 {
        self.amplitude
    }

    /// Noise standard deviation as a percentage of the amplitude
    pub fn noise(&self) -> f64 {
        self.noise
    }

    pub fn count(&self) -> TransientCount {
        self.count
    }

    pub fn cycle_length_ms(&self) -> f64 {
        self.cycle_length_ms
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// `floor(fps / 1000 * duration)`
    pub fn frame_count(&self) -> usize {
        (self.fps as f64 / 1000.0 * self.duration_ms).floor() as usize
    }

    /// Milliseconds between frames
    pub fn frame_period_ms(&self) -> f64 {
        1000.0 / self.fps as f64
    }

    /// Frame index of every transient onset that falls inside the recording
    pub fn onset_frames(&self) -> Vec<usize> {
        let frames = self.frame_count();
        let frame_t = self.frame_period_ms();
        let limit = match self.count {
            TransientCount::Count(n) => n as usize,
            TransientCount::Full => usize::MAX,
        };

        (0..limit)
            .map(|k| self.onset_ms + k as f64 * self.cycle_length_ms)
            .take_while(|&t| t < self.duration_ms)
            .map(|t| (t / frame_t).round() as usize)
            .filter(|&frame| frame < frames)
            .collect()
    }

    pub(crate) fn with_onset(&self, onset_ms: f64) -> Self {
        Self { onset_ms, ..self.clone() }
    }

    pub(crate) fn with_noise(&self, noise: f64) -> Self {
        Self { noise, ..self.clone() }
    }

    pub(crate) fn with_seed(&self, seed: Option<u64>) -> Self {
        Self { seed, ..self.clone() }
    }
}

impl WaveformSpecBuilder {
    pub fn duration_ms(mut self, duration_ms: f64) -> Self {
        self.spec.duration_ms = duration_ms;
        self
    }

    pub fn onset_ms(mut self, onset_ms: f64) -> Self {
        self.spec.onset_ms = onset_ms;
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.spec.fps = fps;
        self
    }

    pub fn baseline(mut self, baseline: u32) -> Self {
        self.spec.baseline = baseline;
        self
    }

    pub fn amplitude(mut self, amplitude: i32) -> Self {
        self.spec.amplitude = amplitude;
        self
    }

    pub fn noise(mut self, noise: f64) -> Self {
        self.spec.noise = noise;
        self
    }

    pub fn count(mut self, count: TransientCount) -> Self {
        self.spec.count = count;
        self
    }

    pub fn cycle_length_ms(mut self, cycle_length_ms: f64) -> Self {
        self.spec.cycle_length_ms = cycle_length_ms;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.spec.seed = Some(seed);
        self
    }

    /// Run every parameter check and produce the [`WaveformSpec`]
    pub fn build(self) -> AnalysisResult<WaveformSpec> {
        let spec = self.spec;
        let err = || AnalysisErrorBuilder::new("waveform", "build");

        validate_finite("waveform", "duration_ms", spec.duration_ms)?;
        validate_finite("waveform", "onset_ms", spec.onset_ms)?;
        validate_finite("waveform", "noise", spec.noise)?;
        validate_finite("waveform", "cycle_length_ms", spec.cycle_length_ms)?;

        if spec.duration_ms < waveform::MIN_DURATION_MS {
            return Err(err()
                .invalid_value("duration_ms", "the recording must be at least 100 ms long")
                .with_values(format!(">= {}", waveform::MIN_DURATION_MS), spec.duration_ms));
        }
        if spec.onset_ms < 0.0 || spec.onset_ms >= spec.duration_ms {
            return Err(err()
                .invalid_value("onset_ms", "the onset must be non-negative and before the end of the recording")
                .with_values(format!("[0, {})", spec.duration_ms), spec.onset_ms));
        }
        if spec.fps <= waveform::MIN_FPS_EXCLUSIVE || spec.fps > waveform::MAX_FPS {
            return Err(err()
                .invalid_value("fps", "frame rate out of range")
                .with_values(format!("({}, {}]", waveform::MIN_FPS_EXCLUSIVE, waveform::MAX_FPS), spec.fps));
        }
        if spec.amplitude < 0 {
            return Err(err()
                .invalid_value("amplitude", "the amplitude must be non-negative")
                .with_values(">= 0", spec.amplitude));
        }
        if spec.baseline > waveform::FL_COUNT_MAX {
            return Err(err()
                .invalid_value("baseline", "baseline exceeds the 16-bit ceiling")
                .with_values(format!("<= {}", waveform::FL_COUNT_MAX), spec.baseline));
        }
        if spec.amplitude.unsigned_abs() > waveform::FL_COUNT_MAX {
            return Err(err()
                .invalid_value("amplitude", "amplitude exceeds the 16-bit ceiling")
                .with_values(format!("<= {}", waveform::FL_COUNT_MAX), spec.amplitude));
        }
        if spec.noise < 0.0 {
            return Err(err()
                .invalid_value("noise", "noise must be a non-negative percentage")
                .with_values(">= 0", spec.noise));
        }
        if spec.cycle_length_ms < waveform::MIN_CYCLE_LENGTH_MS {
            return Err(err()
                .invalid_value("cycle_length_ms", "cycle length too short")
                .with_values(format!(">= {}", waveform::MIN_CYCLE_LENGTH_MS), spec.cycle_length_ms));
        }
        if spec.count == TransientCount::Count(0) {
            return Err(err()
                .invalid_value("count", "at least one transient is required")
                .with_values(">= 1", 0));
        }

        Ok(spec)
    }
}

/// Fixed morphology of one transient type
struct PhaseShape {
    upstroke_ms: f64,
    upstroke_shape: f64,
    early_ms: f64,
    early_fraction: f64,
    transient_ms: f64,
    late_scale: f64,
}

impl PhaseShape {
    fn for_type(model_type: TransientType) -> Self {
        match model_type {
            TransientType::Vm => Self {
                upstroke_ms: vm::UPSTROKE_MS,
                upstroke_shape: vm::UPSTROKE_SHAPE,
                early_ms: vm::EARLY_REPOL_MS,
                early_fraction: vm::EARLY_REPOL_FRACTION,
                transient_ms: vm::TRANSIENT_MS,
                late_scale: vm::LATE_DECAY_SCALE,
            },
            TransientType::Ca => Self {
                upstroke_ms: ca::UPSTROKE_MS,
                upstroke_shape: ca::UPSTROKE_SHAPE,
                early_ms: ca::EARLY_REPOL_MS,
                early_fraction: ca::EARLY_REPOL_FRACTION,
                transient_ms: ca::TRANSIENT_MS,
                late_scale: ca::LATE_DECAY_SCALE,
            },
        }
    }
}

/// Samples of a single transient (upstroke, early and late repolarization)
/// at the given frame period, truncated to whole counts.
pub fn transient_shape(model_type: TransientType, frame_t: f64, baseline: u32, amplitude: i32) -> Vec<f64> {
    let shape = PhaseShape::for_type(model_type);
    let f0 = baseline as f64;
    // Vm is a downward deflection
    let a = match model_type {
        TransientType::Vm => -(amplitude as f64),
        TransientType::Ca => amplitude as f64,
    };

    let dep_frames = (shape.upstroke_ms / frame_t).round() as usize;
    let upstroke = (0..dep_frames).map(|i| {
        let x = (i as f64 - dep_frames as f64) / shape.upstroke_shape;
        f0 + a * (-(x * x)).exp()
    });

    let early_frames = (shape.early_ms / frame_t).round() as usize;
    let slope = -(a - a * shape.early_fraction) / shape.early_ms;
    let early = (0..early_frames).map(move |i| slope * (i as f64 * frame_t) + a + f0);

    let late_ms = shape.transient_ms - shape.upstroke_ms - shape.early_ms;
    let late_frames = (late_ms / frame_t).round() as usize;
    let late_amp = a * shape.early_fraction;
    // Decay rate follows the early slope; a flat transient has no slope
    let rate = if slope == 0.0 { 0.0 } else { shape.late_scale / slope.abs() };
    let late = linspace(0.0, late_ms, late_frames)
        .into_iter()
        .map(move |t| late_amp * (-rate * t).exp() + f0);

    upstroke.chain(early).chain(late).map(f64::trunc).collect()
}

/// Synthesize a recording with the transient train described by `spec`
pub fn model_transients(spec: &WaveformSpec) -> AnalysisResult<Signal<f64>> {
    let frames = spec.frame_count();
    let frame_t = spec.frame_period_ms();
    let onsets = spec.onset_frames();

    debug!(
        model_type = ?spec.model_type,
        frames,
        transients = onsets.len(),
        "synthesizing transient train"
    );

    let time = Array1::from_shape_fn(frames, |i| i as f64 * frame_t);
    let mut data = Array1::from_elem(frames, spec.baseline as f64);

    let transient = transient_shape(spec.model_type, frame_t, spec.baseline, spec.amplitude);
    for start in onsets {
        let end = (start + transient.len()).min(frames);
        for (slot, &value) in data.slice_mut(ndarray::s![start..end]).iter_mut().zip(&transient) {
            *slot = value;
        }
    }

    let sd = spec.noise / 100.0 * spec.amplitude as f64;
    NoiseModel::new(spec.seed).add_noise(&mut data, sd);

    Signal::assemble(time, data, spec.fps as f64, ProcessingStage::Synthesis)
}

/// Synthesize a recording carrying a single transient at its configured onset
pub fn model_transient(spec: &WaveformSpec) -> AnalysisResult<Signal<f64>> {
    let single = WaveformSpec { count: TransientCount::Count(1), ..spec.clone() };
    model_transients(&single)
}

fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}
