//! Error taxonomy for trace-level streaming, layered on top of
//! `rvtrace_core::Error` so each I/O failure carries its cause through
//! one `#[from]` hop.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] rvtrace_core::Error),

    #[error("failed to open {path}: {source}")]
    FileOpenFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("parse error: unrecognized literal {literal:?}")]
    ParseError { literal: String },
}

pub type Result<T> = std::result::Result<T, Error>;
