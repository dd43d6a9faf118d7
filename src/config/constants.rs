// src/config/constants.rs
//! Crate-wide constants for synthesis and analysis

/// Waveform synthesis constants
pub mod waveform {
    /// 16-bit fluorescence ceiling (2^16 - 1)
    pub const FL_COUNT_MAX: u32 = 65_535;
    pub const MIN_DURATION_MS: f64 = 100.0;
    /// Exclusive lower bound on the frame rate
    pub const MIN_FPS_EXCLUSIVE: u32 = 200;
    pub const MAX_FPS: u32 = 1000;
    pub const MIN_CYCLE_LENGTH_MS: f64 = 50.0;

    pub const DEFAULT_DURATION_MS: f64 = 100.0;
    pub const DEFAULT_ONSET_MS: f64 = 0.0;
    pub const DEFAULT_FPS: u32 = 1000;
    pub const DEFAULT_BASELINE: u32 = 100;
    pub const DEFAULT_AMPLITUDE: i32 = 10;
    pub const DEFAULT_CYCLE_LENGTH_MS: f64 = 100.0;

    /// Vm (action potential) phase constants
    pub mod vm {
        pub const UPSTROKE_MS: f64 = 10.0;
        pub const UPSTROKE_SHAPE: f64 = 3.0;
        pub const EARLY_REPOL_MS: f64 = 3.0;
        /// APD20: early repolarization ends at 80% of peak
        pub const EARLY_REPOL_FRACTION: f64 = 0.8;
        pub const TRANSIENT_MS: f64 = 50.0;
        pub const LATE_DECAY_SCALE: f64 = 2.0;
    }

    /// Ca (calcium transient) phase constants
    pub mod ca {
        pub const UPSTROKE_MS: f64 = 15.0;
        pub const UPSTROKE_SHAPE: f64 = 6.0;
        pub const EARLY_REPOL_MS: f64 = 15.0;
        /// CAD40: early repolarization ends at 60% of peak
        pub const EARLY_REPOL_FRACTION: f64 = 0.6;
        pub const TRANSIENT_MS: f64 = 100.0;
        pub const LATE_DECAY_SCALE: f64 = 0.3;
    }
}

/// Stack propagation constants
pub mod propagation {
    pub const DEFAULT_HEIGHT: usize = 50;
    pub const DEFAULT_WIDTH: usize = 100;
    pub const DEFAULT_DURATION_MS: f64 = 150.0;
    pub const DEFAULT_ONSET_MS: f64 = 15.0;
    pub const DEFAULT_FPS: u32 = 500;
    /// Conduction velocity in cm/s
    pub const DEFAULT_VELOCITY_CM_S: f64 = 15.0;
    /// Edge length of one pixel in cm (100 µm)
    pub const DEFAULT_PIXEL_SIZE_CM: f64 = 0.01;
}

/// Spatial filter constants
pub mod spatial {
    pub const MIN_KERNEL_SIZE: usize = 3;
    pub const DEFAULT_KERNEL_SIZE: usize = 3;
    /// Registry of supported spatial kernels
    pub const SPATIAL_FILTERS: &[&str] = &["gaussian", "mean", "median"];
}

/// Temporal filter constants
pub mod temporal {
    pub const DEFAULT_CUTOFF_HZ: f64 = 100.0;
    /// Stopband attenuation used by automatic order selection
    pub const DEFAULT_RIPPLE_DB: f64 = 30.0;
    /// Transition band width used by automatic order selection
    pub const DEFAULT_TRANSITION_HZ: f64 = 20.0;
    /// Kaiser's order formula is invalid below this attenuation
    pub const MIN_RIPPLE_DB: f64 = 8.0;
    pub const SYMMETRY_TOLERANCE: f64 = 1e-15;
    /// Longest filter either order mode may design (odd)
    pub const MAX_FILTER_TAPS: usize = 32_767;
    pub const AUTO_SENTINEL: &str = "auto";
}

/// Drift filter constants
pub mod drift {
    pub const MIN_POLY_ORDER: u8 = 1;
    pub const MAX_POLY_ORDER: u8 = 5;
    pub const DEFAULT_POLY_ORDER: u8 = 2;
    pub const EXPONENTIAL_SENTINEL: &str = "exp";
    /// Decay rates searched by the exponential fit, per unit of normalized time
    pub const EXP_RATE_MIN: f64 = 1e-2;
    pub const EXP_RATE_MAX: f64 = 1e2;
    pub const EXP_GRID_POINTS: usize = 120;
    pub const EXP_REFINE_ITERATIONS: usize = 60;
}

/// Signal metric constants
pub mod metrics {
    pub const DEFAULT_NOISE_COUNT: usize = 10;
    /// Samples taken on each side of the detected peak
    pub const PEAK_HALF_WIDTH: usize = 1;
}
