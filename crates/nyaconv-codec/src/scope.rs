//! Sibling lookup for dynamic-size arrays
//!
//! Entering a composite pushes a [`Frame`]; every processed field records its
//! integer value (if any) in the frame. A dynamic-size field resolves its
//! count by searching frames innermost first.

use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::schema::{DerivedValue, Schema};
use crate::value::Value;

/// Values processed so far for one composite object
#[derive(Debug, Clone, Default)]
pub struct Frame {
    values: Vec<(&'static str, Option<i64>)>,
}

impl Frame {
    /// Empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed field; non-integer values are kept as `None`
    pub fn record(&mut self, name: &'static str, value: &Value) {
        self.values.push((name, value.as_integer()));
    }

    /// Integer value of a processed field
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.slot(name).flatten()
    }

    fn slot(&self, name: &str) -> Option<Option<i64>> {
        self.values
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

/// Stack of frames for the objects currently being processed
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    frames: Vec<(Vec<DerivedValue>, Frame)>,
}

impl ScopeStack {
    /// Enter an object of the given schema
    pub(crate) fn push(&mut self, schema: &Schema) {
        self.frames.push((schema.derived_values().to_vec(), Frame::new()));
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn record(&mut self, name: &'static str, value: &Value) {
        if let Some((_, frame)) = self.frames.last_mut() {
            frame.record(name, value);
        }
    }

    /// Resolve the element count named by a dynamic-size field
    pub(crate) fn resolve_size(&self, name: &'static str) -> CodecResult<usize> {
        for (depth, (derived, frame)) in self.frames.iter().rev().enumerate() {
            let slot = match frame.slot(name) {
                Some(slot) => Some(slot),
                None => derived
                    .iter()
                    .find(|d| d.name == name)
                    .and_then(|d| (d.compute)(frame))
                    .map(Some),
            };

            if let Some(slot) = slot {
                let size = slot.ok_or(CodecError::NotAnInteger { name })?;
                trace!(field = name, depth, size, "Resolved dynamic size");
                return usize::try_from(size).map_err(|_| CodecError::NegativeSize { size });
            }
        }

        Err(CodecError::MissingSizeField { name })
    }
}
