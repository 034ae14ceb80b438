//! Trace-level streaming over cycles built by `rvtrace-core`.
//!
//! Three storage shapes, one per binary/text split: a
//! plain memory/file cursor over a concatenation of same-form binary
//! cycles (`binary`, `memory_reader`, `file_reader`, `writer`), a sharded
//! on-disk index trace of logger-form shards (`index`), and a
//! line-oriented text trace plus a minimal GDB log dialect (`text`,
//! `gdb`). All four expose cycles behind `rvtrace_core::Cycle`.

mod binary;
mod error;
mod file_reader;
mod gdb;
mod index;
mod memory_reader;
mod text;
mod writer;

pub use binary::{BinaryCycle, BinaryFormat};
pub use error::{Error, Result};
pub use file_reader::TraceFileReader;
pub use gdb::GdbTraceReader;
pub use index::{IndexEntry, IndexTraceReader, IndexTraceWriter, DEFAULT_MAX_CYCLES_PER_SHARD};
pub use memory_reader::TraceMemoryReader;
pub use text::{TextTraceReader, TextTraceWriter};
pub use writer::{FileTraceWriter, MemoryTraceWriter};
