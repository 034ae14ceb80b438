//! Error taxonomy for the CLI layer: wraps each library crate's own error
//! enum, following the same per-crate-wraps-the-one-below convention as
//! `rvtrace_io::Error`/`rvtrace_fmt::Error`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] rvtrace_core::Error),

    #[error(transparent)]
    Io(#[from] rvtrace_io::Error),

    #[error(transparent)]
    Fmt(#[from] rvtrace_fmt::Error),

    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
