//! Error taxonomy for cycle filtering and printing, layered on top of
//! `rvtrace_core::Error` following the same per-crate-wraps-the-one-below
//! convention as `rvtrace_io::Error`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] rvtrace_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unknown filter tag {tag:?}")]
    UnknownFilter { tag: String },

    #[error("malformed filter description {description:?}")]
    MalformedFilter { description: String },
}

pub type Result<T> = std::result::Result<T, Error>;
