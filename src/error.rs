//! Error taxonomy for the analysis pipeline. All failures are local and
//! synchronous; the caller decides how to surface them, and nothing here is
//! retried.

use std::io;

use thiserror::Error;

use crate::normalize::MIN_TRACE_LEN;

#[derive(Debug, Error)]
pub enum TraceError {
    /// Normalization needs a full sliding window plus margin of signal.
    #[error("trace has {} samples; at least {} are required", .0, MIN_TRACE_LEN)]
    InputTooShort(usize),

    #[error("unreadable trace file: {0}")]
    UnreadableTraceFile(String),

    #[error("invalid target sequence {0:?}: only A, C, G and T are allowed")]
    InvalidTargetSequence(String),

    #[error("invalid target range {start}..={end} for a target of length {len}")]
    InvalidTargetRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// An off-target anchor that satisfies neither the sense nor the
    /// antisense coordinate convention; no strand interpretation exists.
    #[error("off-target anchor {0} is outside both strand coordinate ranges")]
    AnchorOutOfRange(isize),

    #[error(transparent)]
    Io(#[from] io::Error),
}
