// src/io.rs
//! Boundary to the import collaborators
//!
//! File formats live outside the core. Importers implement [`SignalSource`]
//! and [`StackSource`] and hand the core typed arrays; [`MemorySource`] is
//! the in-memory implementation used for tests and embedding.

use crate::error::{AnalysisErrorBuilder, AnalysisResult, ProcessingStage};
use crate::types::Signal;
use ndarray::{Array1, Array3};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Metadata attached to an imported stack
#[derive(Debug, Clone, PartialEq)]
pub enum StackMetadata {
    /// Parsed key/value records
    Map(BTreeMap<String, String>),
    /// Unparsed metadata text
    Raw(String),
}

/// Imports 16-bit traces
pub trait SignalSource {
    /// Open the trace named by `source`. `fps` overrides the source's own
    /// frame rate. Missing sources are not-found failures.
    fn open_signal(&self, source: &str, fps: Option<f64>) -> AnalysisResult<Signal<u16>>;
}

/// Imports 16-bit (frame, row, column) stacks
pub trait StackSource {
    /// Open the stack named by `source`, with metadata read from `meta` when
    /// given. Missing sources are not-found failures.
    fn open_stack(&self, source: &str, meta: Option<&str>) -> AnalysisResult<(Array3<u16>, StackMetadata)>;
}

/// In-memory source keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    signals: HashMap<String, (Array1<u16>, f64)>,
    stacks: HashMap<String, Array3<u16>>,
    metadata: HashMap<String, StackMetadata>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_signal(&mut self, id: &str, data: Array1<u16>, fps: f64) {
        self.signals.insert(id.to_string(), (data, fps));
    }

    pub fn insert_stack(&mut self, id: &str, stack: Array3<u16>) {
        self.stacks.insert(id.to_string(), stack);
    }

    /// Metadata stored under a stack's own id is returned when no explicit
    /// metadata source is requested
    pub fn insert_metadata(&mut self, id: &str, metadata: StackMetadata) {
        self.metadata.insert(id.to_string(), metadata);
    }
}

fn check_identifier(operation: &str, source: &str) -> AnalysisResult<()> {
    if source.trim().is_empty() {
        return Err(AnalysisErrorBuilder::new("io", operation)
            .invalid_type("source", "source identifier must be a non-empty path or key"));
    }
    Ok(())
}

impl SignalSource for MemorySource {
    fn open_signal(&self, source: &str, fps: Option<f64>) -> AnalysisResult<Signal<u16>> {
        check_identifier("open_signal", source)?;
        let (data, stored_fps) = self
            .signals
            .get(source)
            .ok_or_else(|| AnalysisErrorBuilder::new("io", "open_signal").not_found(source))?;
        trace!(source, samples = data.len(), "opened signal");
        Signal::new(data.clone(), fps.unwrap_or(*stored_fps))
    }
}

impl StackSource for MemorySource {
    fn open_stack(&self, source: &str, meta: Option<&str>) -> AnalysisResult<(Array3<u16>, StackMetadata)> {
        check_identifier("open_stack", source)?;
        let stack = self
            .stacks
            .get(source)
            .ok_or_else(|| AnalysisErrorBuilder::new("io", "open_stack").not_found(source))?;
        if stack.is_empty() {
            return Err(AnalysisErrorBuilder::new("io", "open_stack")
                .degenerate(ProcessingStage::Import, "stack holds no pixels"));
        }

        let metadata = match meta {
            Some(meta) => {
                check_identifier("open_stack", meta)?;
                self.metadata
                    .get(meta)
                    .cloned()
                    .ok_or_else(|| AnalysisErrorBuilder::new("io", "open_stack").not_found(meta))?
            }
            None => self
                .metadata
                .get(source)
                .cloned()
                .unwrap_or_else(|| StackMetadata::Map(BTreeMap::new())),
        };

        trace!(source, shape = ?stack.dim(), "opened stack");
        Ok((stack.clone(), metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::array;

    #[test]
    fn test_open_signal() {
        let mut source = MemorySource::new();
        source.insert_signal("trace.csv", array![100u16, 101, 99], 500.0);

        let signal = source.open_signal("trace.csv", None).unwrap();
        assert_eq!(signal.fps(), 500.0);
        assert_eq!(signal.time()[1], 2.0);

        let signal = source.open_signal("trace.csv", Some(1000.0)).unwrap();
        assert_eq!(signal.time()[1], 1.0);

        let err = source.open_signal("missing.csv", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = source.open_signal("", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_open_stack_with_metadata() {
        let mut source = MemorySource::new();
        source.insert_stack("stack.tif", Array3::zeros((4, 2, 2)));
        source.insert_metadata("stack.txt", StackMetadata::Raw("Frame rate: 500".into()));

        let (stack, meta) = source.open_stack("stack.tif", None).unwrap();
        assert_eq!(stack.dim(), (4, 2, 2));
        assert_eq!(meta, StackMetadata::Map(BTreeMap::new()));

        let (_, meta) = source.open_stack("stack.tif", Some("stack.txt")).unwrap();
        assert_eq!(meta, StackMetadata::Raw("Frame rate: 500".into()));

        let err = source.open_stack("stack.tif", Some("other.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = source.open_stack("nope.tif", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        source.insert_stack("empty.tif", Array3::zeros((0, 2, 2)));
        let err = source.open_stack("empty.tif", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Degenerate);
    }
}
