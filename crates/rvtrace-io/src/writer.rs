//! Trace writer — memory and file variants. Append-only; no transactional
//! semantics (a failed write leaves the destination truncated at the last
//! successful boundary), per spec §4.9.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::Path;

use rvtrace_core::Error as CoreError;

use crate::error::{Error, Result};

/// Appends cycle bytes into a fixed-capacity in-memory buffer.
pub struct MemoryTraceWriter {
    buffer: Vec<u8>,
    capacity: usize,
}

impl MemoryTraceWriter {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.buffer.len() + bytes.len() > self.capacity {
            return Err(CoreError::BufferOverflow {
                capacity: self.capacity as u32,
            }
            .into());
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Appends cycle bytes to a file, flushing after each write (no buffered
/// writer that could silently lose a tail on a crash).
pub struct FileTraceWriter {
    file: File,
}

impl FileTraceWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| Error::FileOpenFailure {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self { file })
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvtrace_core::{BasicInfo, CycleBuilder, CycleConfig, NodeKind};

    fn one_cycle() -> Vec<u8> {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        b.set_basic_info(BasicInfo { cycle: 0, xlen: 32, pc: 0 }).unwrap();
        b.into_bytes()
    }

    #[test]
    fn memory_writer_and_reader_round_trip_twice() {
        let cycle = one_cycle();
        let mut writer = MemoryTraceWriter::new(1024);
        writer.write(&cycle).unwrap();
        writer.write(&cycle).unwrap();

        let bytes = writer.into_bytes();
        let mut reader =
            crate::memory_reader::TraceMemoryReader::new(&bytes, crate::binary::BinaryFormat::Container).unwrap();
        assert!(reader.is_begin());
        reader.next().unwrap();
        assert!(!reader.is_end());
        reader.next().unwrap();
        assert!(reader.is_end());
        assert!(reader.next().is_err());
    }

    #[test]
    fn memory_writer_overflow_on_tiny_capacity() {
        let mut writer = MemoryTraceWriter::new(4);
        assert!(writer.write(&one_cycle()).is_err());
    }

    #[test]
    fn file_writer_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tbin");
        let mut writer = FileTraceWriter::create(&path).unwrap();
        writer.write(&one_cycle()).unwrap();
        drop(writer);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), one_cycle().len());
    }
}
