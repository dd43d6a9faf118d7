// src/simulation/mod.rs
//! Synthetic ground truth for validating the analysis pipeline

pub mod noise_models;
pub mod propagation;
pub mod waveform;

pub use noise_models::NoiseModel;
pub use propagation::{model_stack_propagation, PropagationSpec};
pub use waveform::{
    model_transient,
    model_transients,
    transient_shape,
    TransientCount,
    WaveformSpec,
    WaveformSpecBuilder,
};
