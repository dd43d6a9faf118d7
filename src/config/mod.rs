// src/config/mod.rs
//! Analysis configuration management

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use crate::processing::filters::{DriftOrder, FilterOrder, SpatialKernel};
use serde::{Deserialize, Serialize};

/// Complete analysis configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub spatial: SpatialFilterConfig,
    #[serde(default)]
    pub temporal: TemporalFilterConfig,
    #[serde(default)]
    pub drift: DriftFilterConfig,
    #[serde(default)]
    pub snr: SnrConfig,
}

/// Spatial filter configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SpatialFilterConfig {
    #[serde(default = "defaults::spatial_kernel")]
    pub kernel: SpatialKernel,

    #[serde(default = "defaults::kernel_size")]
    pub size: usize,
}

/// Temporal (FIR low-pass) filter configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TemporalFilterConfig {
    #[serde(default = "defaults::cutoff_hz")]
    pub cutoff_hz: f64,

    #[serde(default = "defaults::filter_order")]
    pub order: FilterOrder,

    /// Stopband attenuation for automatic order selection
    #[serde(default = "defaults::ripple_db")]
    pub ripple_db: f64,

    /// Transition band width for automatic order selection
    #[serde(default = "defaults::transition_hz")]
    pub transition_hz: f64,
}

/// Drift removal configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DriftFilterConfig {
    #[serde(default = "defaults::drift_order")]
    pub order: DriftOrder,
}

/// SNR estimation configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SnrConfig {
    #[serde(default = "defaults::noise_count")]
    pub noise_count: usize,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;
    use crate::processing::filters::{DriftOrder, FilterOrder, SpatialKernel};

    pub fn spatial_kernel() -> SpatialKernel { SpatialKernel::Gaussian }
    pub fn kernel_size() -> usize { spatial::DEFAULT_KERNEL_SIZE }

    pub fn cutoff_hz() -> f64 { temporal::DEFAULT_CUTOFF_HZ }
    pub fn filter_order() -> FilterOrder { FilterOrder::Auto }
    pub fn ripple_db() -> f64 { temporal::DEFAULT_RIPPLE_DB }
    pub fn transition_hz() -> f64 { temporal::DEFAULT_TRANSITION_HZ }

    pub fn drift_order() -> DriftOrder { DriftOrder::Polynomial(drift::DEFAULT_POLY_ORDER) }

    pub fn noise_count() -> usize { metrics::DEFAULT_NOISE_COUNT }
}

impl Default for SpatialFilterConfig {
    fn default() -> Self {
        Self {
            kernel: defaults::spatial_kernel(),
            size: defaults::kernel_size(),
        }
    }
}

impl Default for TemporalFilterConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: defaults::cutoff_hz(),
            order: defaults::filter_order(),
            ripple_db: defaults::ripple_db(),
            transition_hz: defaults::transition_hz(),
        }
    }
}

impl Default for DriftFilterConfig {
    fn default() -> Self {
        Self { order: defaults::drift_order() }
    }
}

impl Default for SnrConfig {
    fn default() -> Self {
        Self { noise_count: defaults::noise_count() }
    }
}

impl AnalysisConfig {
    /// Validate configuration consistency.
    ///
    /// Checks that do not depend on the data (kernel policy, order ranges,
    /// positive frequencies). Cutoff against Nyquist is checked when a sample
    /// rate is known, see [`AnalysisConfig::validate_for_sample_rate`].
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.spatial.size < spatial::MIN_KERNEL_SIZE || self.spatial.size % 2 == 0 {
            errors.push(format!(
                "Spatial kernel size must be odd and >= {}, got {}",
                spatial::MIN_KERNEL_SIZE, self.spatial.size
            ));
        }

        if !(self.temporal.cutoff_hz.is_finite() && self.temporal.cutoff_hz > 0.0) {
            errors.push(format!(
                "Temporal cutoff must be a positive frequency, got {} Hz",
                self.temporal.cutoff_hz
            ));
        }

        if let FilterOrder::Explicit(0) = self.temporal.order {
            errors.push("Temporal filter order must be positive".to_string());
        }

        if self.temporal.order == FilterOrder::Auto {
            if !(self.temporal.ripple_db >= temporal::MIN_RIPPLE_DB) {
                errors.push(format!(
                    "Ripple must be at least {} dB for automatic order selection, got {}",
                    temporal::MIN_RIPPLE_DB, self.temporal.ripple_db
                ));
            }
            if !(self.temporal.transition_hz.is_finite() && self.temporal.transition_hz > 0.0) {
                errors.push(format!(
                    "Transition width must be positive, got {} Hz",
                    self.temporal.transition_hz
                ));
            }
        }

        if let DriftOrder::Polynomial(degree) = self.drift.order {
            if !(drift::MIN_POLY_ORDER..=drift::MAX_POLY_ORDER).contains(&degree) {
                errors.push(format!(
                    "Drift polynomial order must be in [{}, {}], got {}",
                    drift::MIN_POLY_ORDER, drift::MAX_POLY_ORDER, degree
                ));
            }
        }

        if self.snr.noise_count == 0 {
            errors.push("SNR noise count must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Additionally check the temporal cutoff against the Nyquist frequency
    pub fn validate_for_sample_rate(&self, sample_rate: f64) -> Result<(), Vec<String>> {
        let mut errors = match self.validate_consistency() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        let nyquist = sample_rate / 2.0;
        if self.temporal.cutoff_hz >= nyquist {
            errors.push(format!(
                "Temporal cutoff ({} Hz) must be less than Nyquist frequency ({} Hz)",
                self.temporal.cutoff_hz, nyquist
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
