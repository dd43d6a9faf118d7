//! Optimap-Core: signal analysis core for cardiac optical mapping
//!
//! This library conditions and measures fluorescence recordings of
//! transmembrane voltage (Vm) and intracellular calcium (Ca). It features:
//!
//! - Synthetic transients and propagating activation stacks as ground truth
//! - Spatial, temporal and baseline-drift filters
//! - Normalization, F/F0, percent error and automatic SNR estimation
//! - Layered configuration with environment overrides
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use optimap_core::{calculate_snr, model_transient, TransientType, WaveformSpec};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let spec = WaveformSpec::builder(TransientType::Ca)
//!         .duration_ms(500.0)
//!         .amplitude(100)
//!         .noise(5.0)
//!         .seed(7)
//!         .build()?;
//!     let signal = model_transient(&spec)?;
//!
//!     let snr = calculate_snr(signal.data().view(), 100)?;
//!     println!("SNR: {:.1}", snr.snr);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod io;
pub mod processing;
pub mod simulation;
pub mod types;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{AnalysisConfig, ConfigLoader};
pub use error::{AnalysisError, AnalysisErrorBuilder, AnalysisResult, ErrorKind, ProcessingStage};
pub use io::{MemorySource, SignalSource, StackMetadata, StackSource};
pub use processing::{
    calc_ff0, calculate_error, calculate_snr, filter_drift, filter_spatial, filter_stack_spatial,
    filter_stack_temporal, filter_temporal, invert, map_snr, normalize, AnalysisPipeline, DriftOrder,
    ErrorResult, FilterOrder, SnrResult, SpatialKernel,
};
pub use simulation::{model_stack_propagation, model_transient, model_transients, PropagationSpec, WaveformSpec};
pub use types::{Frame, Sample, Signal, Stack, TransientType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Signal analysis core for cardiac optical mapping".to_string(),
        features: vec![
            "Synthetic transient and propagation models".to_string(),
            "Spatial, temporal and drift filtering".to_string(),
            "SNR and error metrics".to_string(),
            "Layered configuration management".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
