// src/processing/mod.rs
//! Conditioning filters and signal metrics for optical recordings

pub mod filters;
pub mod metrics;
pub mod pipeline;
pub mod snr;

pub use filters::*;
pub use metrics::*;
pub use pipeline::*;
pub use snr::*;
