//! Error taxonomy for the cycle container and logger formats.

use thiserror::Error;

use crate::node::NodeKind;

/// Errors raised while building, reading, or navigating cycles.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open {path}")]
    FileOpenFailure { path: String },

    #[error("trace corrupted at offset {at_offset:?}: {reason}")]
    Corruption { at_offset: Option<i64>, reason: String },

    #[error("node {kind:?}[{index}] not found")]
    NodeNotFound { kind: NodeKind, index: i32 },

    #[error("size mismatch for {kind:?}: expected {expected}, got {actual}")]
    SizeMismatch {
        kind: NodeKind,
        expected: i64,
        actual: i64,
    },

    #[error("index {i} out of range (0..{n})")]
    IndexOutOfRange { i: i32, n: i32 },

    #[error("buffer overflow: capacity {capacity} exceeded")]
    BufferOverflow { capacity: u32 },

    #[error("size computation overflowed")]
    Overflow,

    #[error("a container cycle cannot declare both Pc32 and Pc64")]
    MixedPc,

    #[error("parse error{}", literal.as_ref().map(|l| format!(": unrecognized literal {l:?}")).unwrap_or_default())]
    ParseError { literal: Option<String> },

    #[error("{feature} is not implemented")]
    NotImplemented { feature: String },
}

pub type Result<T> = std::result::Result<T, Error>;
