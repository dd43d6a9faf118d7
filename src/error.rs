// src/error.rs
//! Unified error handling for the optical-mapping analysis core
//!
//! Every operation validates its inputs before computing and reports failures
//! through [`AnalysisError`]. The variants follow a fixed taxonomy so callers
//! can classify a failure with [`AnalysisError::kind`] without matching on
//! message text.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::time::SystemTime;

/// Unified error type for the analysis core
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Argument has the wrong fundamental kind (e.g. a NaN where a number is required)
    InvalidType {
        parameter: String,
        reason: String,
        context: ErrorContext,
    },

    /// Argument has the right type but an out-of-contract value
    InvalidValue {
        parameter: String,
        reason: String,
        expected: Option<String>,
        actual: Option<String>,
        context: ErrorContext,
    },

    /// An invariant the implementation itself guarantees was violated
    Integrity {
        stage: ProcessingStage,
        reason: String,
        context: ErrorContext,
    },

    /// Input is valid but mathematically unsuitable for the computation
    Degenerate {
        stage: ProcessingStage,
        reason: String,
        context: ErrorContext,
    },

    /// A source handed to an import collaborator does not exist
    NotFound {
        source_id: String,
        context: ErrorContext,
    },

    /// Configuration loading and consistency errors
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },
}

/// Coarse classification of an [`AnalysisError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidType,
    InvalidValue,
    Integrity,
    Degenerate,
    NotFound,
    Configuration,
}

/// Processing stages for error tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Synthesis,
    SpatialFiltering,
    TemporalFiltering,
    DriftRemoval,
    Metrics,
    Import,
}

/// Error context for debugging and analysis
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: HashMap<String, String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: HashMap::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(
        component: &str,
        operation: &str,
        file: &'static str,
        line: u32,
    ) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl AnalysisError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidType { .. } => ErrorKind::InvalidType,
            AnalysisError::InvalidValue { .. } => ErrorKind::InvalidValue,
            AnalysisError::Integrity { .. } => ErrorKind::Integrity,
            AnalysisError::Degenerate { .. } => ErrorKind::Degenerate,
            AnalysisError::NotFound { .. } => ErrorKind::NotFound,
            AnalysisError::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Context attached at the point of failure
    pub fn context(&self) -> &ErrorContext {
        match self {
            AnalysisError::InvalidType { context, .. }
            | AnalysisError::InvalidValue { context, .. }
            | AnalysisError::Integrity { context, .. }
            | AnalysisError::Degenerate { context, .. }
            | AnalysisError::NotFound { context, .. }
            | AnalysisError::Configuration { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            AnalysisError::InvalidType { context, .. }
            | AnalysisError::InvalidValue { context, .. }
            | AnalysisError::Integrity { context, .. }
            | AnalysisError::Degenerate { context, .. }
            | AnalysisError::NotFound { context, .. }
            | AnalysisError::Configuration { context, .. } => context,
        }
    }

    /// Record a key/value detail in the error context
    pub fn with_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.context_mut().additional_info.insert(key.into(), value.into());
        self
    }

    /// Attach expected/actual values to an invalid-value error
    pub fn with_values<E: ToString, A: ToString>(self, expected_value: E, actual_value: A) -> Self {
        match self {
            AnalysisError::InvalidValue { parameter, reason, context, .. } => {
                AnalysisError::InvalidValue {
                    parameter,
                    reason,
                    expected: Some(expected_value.to_string()),
                    actual: Some(actual_value.to_string()),
                    context,
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidType { parameter, reason, context } => {
                write!(f, "[TYPE] Invalid type for '{}': {} ({})",
                       parameter, reason, context.operation)
            }
            AnalysisError::InvalidValue { parameter, reason, expected, actual, context } => {
                match (expected, actual) {
                    (Some(exp), Some(act)) => write!(f, "[VALUE] Invalid '{}': {} (expected: {}, got: {}) ({})",
                                                     parameter, reason, exp, act, context.operation),
                    _ => write!(f, "[VALUE] Invalid '{}': {} ({})", parameter, reason, context.operation),
                }
            }
            AnalysisError::Integrity { stage, reason, context } => {
                match (context.file, context.line) {
                    (Some(file), Some(line)) => write!(f, "[INTEGRITY] {:?} stage invariant violated: {} (at {}:{})",
                                                       stage, reason, file, line),
                    _ => write!(f, "[INTEGRITY] {:?} stage invariant violated: {} ({})",
                                stage, reason, context.operation),
                }
            }
            AnalysisError::Degenerate { stage, reason, context } => {
                write!(f, "[DEGENERATE] {:?} stage cannot process input: {} ({})",
                       stage, reason, context.operation)
            }
            AnalysisError::NotFound { source_id, context } => {
                write!(f, "[IMPORT] Source not found: {} ({})", source_id, context.operation)
            }
            AnalysisError::Configuration { component, reason, context } => {
                write!(f, "[CONFIG] Configuration error in {}: {} ({})",
                       component, reason, context.operation)
            }
        }
    }
}

impl Error for AnalysisError {}

impl From<crate::config::ConfigError> for AnalysisError {
    fn from(err: crate::config::ConfigError) -> Self {
        AnalysisError::Configuration {
            component: "config_loader".to_string(),
            reason: err.to_string(),
            context: error_context!("config", "load"),
        }
    }
}

/// Result type alias for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Error builder for convenient error construction. The source location of
/// the `new` call is recorded in the built error's context.
pub struct AnalysisErrorBuilder {
    component: String,
    operation: String,
    location: &'static Location<'static>,
}

impl AnalysisErrorBuilder {
    #[track_caller]
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            location: Location::caller(),
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::with_location(&self.component, &self.operation, self.location.file(), self.location.line())
    }

    pub fn invalid_type(self, parameter: &str, reason: &str) -> AnalysisError {
        AnalysisError::InvalidType {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn invalid_value(self, parameter: &str, reason: &str) -> AnalysisError {
        AnalysisError::InvalidValue {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
            expected: None,
            actual: None,
            context: self.context(),
        }
    }

    pub fn integrity(self, stage: ProcessingStage, reason: &str) -> AnalysisError {
        AnalysisError::Integrity {
            stage,
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn degenerate(self, stage: ProcessingStage, reason: &str) -> AnalysisError {
        AnalysisError::Degenerate {
            stage,
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn not_found(self, source_id: &str) -> AnalysisError {
        AnalysisError::NotFound {
            source_id: source_id.to_string(),
            context: self.context(),
        }
    }

    pub fn configuration(self, reason: &str) -> AnalysisError {
        let context = self.context();
        AnalysisError::Configuration {
            component: self.component,
            reason: reason.to_string(),
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("test_component", "test_operation");
        assert_eq!(context.component, "test_component");
        assert_eq!(context.operation, "test_operation");
        assert!(context.file.is_none());
        assert!(context.timestamp <= SystemTime::now());
    }

    #[test]
    fn test_builder_records_call_site() {
        let line = line!() + 1;
        let err = AnalysisErrorBuilder::new("waveform", "build").integrity(ProcessingStage::Synthesis, "length mismatch");
        let context = err.context();
        assert!(context.file.is_some_and(|file| file.ends_with("error.rs")), "{:?}", context.file);
        assert_eq!(context.line, Some(line));

        let display = err.to_string();
        assert!(display.contains(&format!("error.rs:{}", line)), "{}", display);
    }

    #[test]
    fn test_with_info_attaches_details() {
        let err = AnalysisErrorBuilder::new("snr", "map_snr")
            .invalid_type("signal", "samples must be finite numbers")
            .with_info("pixel", "(2, 5)")
            .with_info("frames", "500");
        let info = &err.context().additional_info;
        assert_eq!(info.get("pixel").map(String::as_str), Some("(2, 5)"));
        assert_eq!(info.get("frames").map(String::as_str), Some("500"));
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_error_context_macro_records_location() {
        let context = error_context!("waveform", "build");
        assert!(context.file.is_some());
        assert!(context.line.unwrap_or(0) > 0);
    }

    #[test]
    fn test_error_builder_kinds() {
        let err = AnalysisErrorBuilder::new("spatial", "filter").invalid_value("kernel", "must be odd");
        assert_eq!(err.kind(), ErrorKind::InvalidValue);

        let err = AnalysisErrorBuilder::new("snr", "calculate")
            .degenerate(ProcessingStage::Metrics, "flat signal");
        assert_eq!(err.kind(), ErrorKind::Degenerate);

        let err = AnalysisErrorBuilder::new("waveform", "build")
            .integrity(ProcessingStage::Synthesis, "length mismatch");
        assert_eq!(err.kind(), ErrorKind::Integrity);

        let err = AnalysisErrorBuilder::new("temporal", "filter").invalid_type("cutoff", "NaN");
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisErrorBuilder::new("spatial", "filter_spatial")
            .invalid_value("kernel_size", "must be an odd integer >= 3")
            .with_values(">= 3, odd", 8);

        let display = format!("{}", err);
        assert!(display.contains("kernel_size"));
        assert!(display.contains("expected: >= 3, odd"));
        assert!(display.contains("got: 8"));
        assert!(display.contains("filter_spatial"));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnalysisError>();
    }
}
