// src/types.rs
//! Core data types shared by the synthesis and analysis modules

use crate::error::{AnalysisErrorBuilder, AnalysisResult, ProcessingStage};
use ndarray::{Array1, Array2, Array3};

/// Numeric sample types an optical recording may carry.
///
/// Integer samples round and saturate when converted back from `f64`, which is
/// how filtered results are restored to the dtype of their input.
pub trait Sample: Copy + Send + Sync + PartialOrd + std::fmt::Debug + 'static {
    /// Widen to `f64` for computation
    fn to_f64(self) -> f64;

    /// Narrow from `f64`, rounding and saturating for integer types
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_integer_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    // `as` saturates at the type bounds and maps NaN to 0
                    value.round() as $t
                }
            }
        )*
    };
}

impl_integer_sample!(u8, u16, u32);

impl Sample for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

/// A 2-D intensity image
pub type Frame<T> = Array2<T>;

/// A 3-D image stack indexed (frame, row, column)
pub type Stack<T> = Array3<T>;

/// Transient morphology
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TransientType {
    /// Membrane voltage, a downward optical deflection
    Vm,
    /// Calcium transient, an upward optical deflection
    Ca,
}

impl std::str::FromStr for TransientType {
    type Err = crate::error::AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Vm" | "vm" => Ok(TransientType::Vm),
            "Ca" | "ca" => Ok(TransientType::Ca),
            other => Err(AnalysisErrorBuilder::new("types", "parse_transient_type")
                .invalid_value("model_type", "the model type must be either 'Vm' or 'Ca'")
                .with_values("Vm | Ca", other)),
        }
    }
}

/// A time series with its timestamps (ms) and frame rate
#[derive(Debug, Clone, PartialEq)]
pub struct Signal<T: Sample = f64> {
    time: Array1<f64>,
    data: Array1<T>,
    fps: f64,
}

impl<T: Sample> Signal<T> {
    /// Build a signal whose timestamps start at 0 and step by `1000 / fps` ms
    pub fn new(data: Array1<T>, fps: f64) -> AnalysisResult<Self> {
        if !fps.is_finite() {
            return Err(AnalysisErrorBuilder::new("signal", "new")
                .invalid_type("fps", "frame rate must be a finite number"));
        }
        if fps <= 0.0 {
            return Err(AnalysisErrorBuilder::new("signal", "new")
                .invalid_value("fps", "frame rate must be positive")
                .with_values("> 0", fps));
        }

        let frame_t = 1000.0 / fps;
        let time = Array1::from_shape_fn(data.len(), |i| i as f64 * frame_t);
        Ok(Self { time, data, fps })
    }

    /// Pair caller-supplied timestamps with samples
    pub fn from_parts(time: Array1<f64>, data: Array1<T>, fps: f64) -> AnalysisResult<Self> {
        if time.len() != data.len() {
            return Err(AnalysisErrorBuilder::new("signal", "from_parts")
                .invalid_value("time", "timestamp and sample arrays must have equal length")
                .with_values(data.len(), time.len()));
        }
        if time.iter().zip(time.iter().skip(1)).any(|(prev, next)| next < prev) {
            return Err(AnalysisErrorBuilder::new("signal", "from_parts")
                .invalid_value("time", "timestamps must be non-decreasing"));
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(AnalysisErrorBuilder::new("signal", "from_parts")
                .invalid_value("fps", "frame rate must be positive")
                .with_values("> 0", fps));
        }
        Ok(Self { time, data, fps })
    }

    /// Internal constructor for arrays the core produced itself; a length
    /// mismatch here is an implementation defect.
    pub(crate) fn assemble(
        time: Array1<f64>,
        data: Array1<T>,
        fps: f64,
        stage: ProcessingStage,
    ) -> AnalysisResult<Self> {
        if time.len() != data.len() {
            return Err(AnalysisErrorBuilder::new("signal", "assemble")
                .integrity(stage, &format!(
                    "lengths of time ({}) and data ({}) arrays not equal",
                    time.len(),
                    data.len()
                )));
        }
        Ok(Self { time, data, fps })
    }

    /// Timestamps in milliseconds
    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    /// Sample values
    pub fn data(&self) -> &Array1<T> {
        &self.data
    }

    /// Frame rate in frames per second
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Split into (timestamps, samples)
    pub fn into_parts(self) -> (Array1<f64>, Array1<T>) {
        (self.time, self.data)
    }

    /// Replace the samples, keeping timestamps and frame rate
    pub fn with_data<U: Sample>(&self, data: Array1<U>) -> AnalysisResult<Signal<U>> {
        Signal::assemble(self.time.clone(), data, self.fps, ProcessingStage::Metrics)
    }

    /// Convert every sample to another dtype
    pub fn cast<U: Sample>(&self) -> Signal<U> {
        Signal {
            time: self.time.clone(),
            data: self.data.mapv(|v| U::from_f64(v.to_f64())),
            fps: self.fps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::array;

    #[test]
    fn test_integer_samples_round_and_saturate() {
        assert_eq!(u16::from_f64(10.6), 11);
        assert_eq!(u16::from_f64(-5.0), 0);
        assert_eq!(u16::from_f64(70_000.0), u16::MAX);
        assert_eq!(u8::from_f64(f64::NAN), 0);
        assert_eq!(f32::from_f64(1.5), 1.5f32);
    }

    #[test]
    fn test_signal_timestamps() {
        let signal = Signal::new(array![1u16, 2, 3, 4], 500.0).unwrap();
        assert_eq!(signal.len(), 4);
        assert_eq!(signal.time()[1], 2.0);
        assert_eq!(signal.time()[3], 6.0);
    }

    #[test]
    fn test_signal_rejects_bad_fps() {
        let err = Signal::new(array![1.0, 2.0], f64::NAN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        let err = Signal::new(array![1.0, 2.0], 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_from_parts_validates_time() {
        let err = Signal::from_parts(array![0.0, 1.0], array![1.0, 2.0, 3.0], 1000.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);

        let err = Signal::from_parts(array![0.0, 2.0, 1.0], array![1.0, 2.0, 3.0], 1000.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_assemble_mismatch_is_integrity_failure() {
        let err = Signal::assemble(array![0.0], array![1.0, 2.0], 1000.0, ProcessingStage::Synthesis)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_with_data_and_cast_keep_timestamps() {
        let signal = Signal::new(array![1.4, 2.6, 70_000.0], 250.0).unwrap();
        let counts: Signal<u16> = signal.cast();
        assert_eq!(counts.data(), &array![1u16, 3, u16::MAX]);
        assert_eq!(counts.time(), signal.time());

        let replaced = signal.with_data(array![0u8, 1, 2]).unwrap();
        assert_eq!(replaced.fps(), 250.0);
        let err = signal.with_data(array![0u8]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_transient_type_parsing() {
        assert_eq!("Vm".parse::<TransientType>().unwrap(), TransientType::Vm);
        assert_eq!("ca".parse::<TransientType>().unwrap(), TransientType::Ca);
        assert_eq!("Na".parse::<TransientType>().unwrap_err().kind(), ErrorKind::InvalidValue);
    }
}
