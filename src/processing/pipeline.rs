// src/processing/pipeline.rs
//! Configured conditioning pipeline for traces and stacks

use crate::config::AnalysisConfig;
use crate::error::{AnalysisErrorBuilder, AnalysisResult, ProcessingStage};
use crate::processing::filters::{filter_drift, filter_stack_spatial, filter_stack_temporal, filter_temporal_with};
use crate::processing::snr::map_snr;
use crate::types::{Sample, Signal};
use ndarray::{Array1, Array2, Array3, ArrayView3};
use std::time::Instant;
use tracing::debug;

/// A conditioned trace and the drift removed from it
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionedSignal {
    pub signal: Signal<f64>,
    pub drift: Array1<f64>,
}

/// Chains the filters of an [`AnalysisConfig`]
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    /// Build a pipeline from a consistent configuration
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate_consistency().map_err(|errors| {
            AnalysisErrorBuilder::new("pipeline", "new").configuration(&errors.join("; "))
        })?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn check_sample_rate(&self, sample_rate: f64) -> AnalysisResult<()> {
        self.config.validate_for_sample_rate(sample_rate).map_err(|errors| {
            AnalysisErrorBuilder::new("pipeline", "check_sample_rate").configuration(&errors.join("; "))
        })
    }

    /// Temporal low-pass followed by drift removal
    pub fn process_signal<T: Sample>(&self, signal: &Signal<T>) -> AnalysisResult<ConditionedSignal> {
        self.check_sample_rate(signal.fps())?;
        let start = Instant::now();

        let filtered = filter_temporal_with(signal.data().view(), signal.fps(), &self.config.temporal)?;
        let (corrected, drift) = filter_drift(filtered.view(), self.config.drift.order)?;
        let conditioned = Signal::assemble(signal.time().clone(), corrected, signal.fps(), ProcessingStage::DriftRemoval)?;

        debug!(
            samples = signal.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "signal conditioned"
        );
        Ok(ConditionedSignal { signal: conditioned, drift })
    }

    /// Spatial filtering of every frame, then temporal filtering of every pixel
    pub fn process_stack<T: Sample>(&self, stack: ArrayView3<'_, T>, fps: f64) -> AnalysisResult<Array3<f64>> {
        self.check_sample_rate(fps)?;
        let start = Instant::now();

        let spatial = filter_stack_spatial(stack, self.config.spatial.kernel, self.config.spatial.size)?;
        let filtered = filter_stack_temporal(spatial.view(), fps, &self.config.temporal)?;

        debug!(
            shape = ?stack.dim(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "stack conditioned"
        );
        Ok(filtered)
    }

    /// Per-pixel SNR with the configured noise window
    pub fn snr_map<T: Sample>(&self, stack: ArrayView3<'_, T>) -> AnalysisResult<Array2<f64>> {
        map_snr(stack, self.config.snr.noise_count)
    }
}
