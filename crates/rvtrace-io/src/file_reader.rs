//! Trace reader — file. Reads an entire file into memory at construction,
//! then applies the same cursor rules as [`TraceMemoryReader`] over the
//! owned buffer.
//!
//! Grounded on `TraceBinaryReaderImpl.cpp`: `fs::file_size` + a single
//! `fread` into an owned buffer, `FileOpenFailureException` on any
//! filesystem error. Backward navigation (`previous()`) is grounded on
//! the container form's footer back-pointer, per spec's "Trace reader —
//! file" component: not available for logger-form traces.

use std::fs;
use std::path::Path;

use tracing::debug;

use rvtrace_core::Error as CoreError;

use crate::binary::{BinaryCycle, BinaryFormat};
use crate::error::{Error, Result};

const FOOTER_SIZE: i64 = 8;

/// Owns a whole trace file's bytes and a cursor over them. Unlike
/// [`crate::memory_reader::TraceMemoryReader`] (which borrows its buffer),
/// this type is self-contained: open a path, get a reader.
pub struct TraceFileReader {
    buffer: Vec<u8>,
    format: BinaryFormat,
    offset: i64,
}

impl TraceFileReader {
    pub fn open(path: impl AsRef<Path>, format: BinaryFormat) -> Result<Self> {
        let buffer = Self::read_file(path.as_ref())?;
        Self::validate(&buffer, format)?;
        Ok(Self {
            buffer,
            format,
            offset: 0,
        })
    }

    /// Opens a trace file, guessing its binary form from its first node
    /// id (see [`BinaryFormat::sniff`]).
    pub fn open_sniffed(path: impl AsRef<Path>) -> Result<Self> {
        let buffer = Self::read_file(path.as_ref())?;
        let format = BinaryFormat::sniff(&buffer);
        Self::validate(&buffer, format)?;
        Ok(Self {
            buffer,
            format,
            offset: 0,
        })
    }

    fn read_file(path: &Path) -> Result<Vec<u8>> {
        let buffer = fs::read(path).map_err(|source| Error::FileOpenFailure {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), bytes = buffer.len(), "loaded trace file");
        Ok(buffer)
    }

    fn validate(buffer: &[u8], format: BinaryFormat) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        BinaryCycle::parse(buffer, format)?;
        Ok(())
    }

    pub fn is_begin(&self) -> bool {
        self.offset == 0
    }

    pub fn is_end(&self) -> bool {
        self.offset == self.buffer.len() as i64
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn format(&self) -> BinaryFormat {
        self.format
    }

    pub fn current_cycle(&self) -> Option<Result<BinaryCycle<'_>>> {
        if self.is_end() {
            return None;
        }
        Some(BinaryCycle::parse(&self.buffer[self.offset as usize..], self.format).map_err(Error::from))
    }

    pub fn next(&mut self) -> Result<()> {
        let cycle = self
            .current_cycle()
            .ok_or_else(|| CoreError::Corruption {
                at_offset: Some(self.offset),
                reason: "next() called past the end of the trace".into(),
            })??;
        let new_offset = self.offset + cycle.size();
        if new_offset > self.buffer.len() as i64 {
            return Err(CoreError::Corruption {
                at_offset: Some(new_offset),
                reason: "advanced offset past end of buffer".into(),
            }
            .into());
        }
        self.offset = new_offset;
        Ok(())
    }

    /// Backward navigation via the container-form footer's back-pointer:
    /// decrements `offset` by `headerOffset + sizeof(Footer)`, read from
    /// the footer immediately preceding the current offset.
    pub fn previous(&mut self) -> Result<()> {
        if self.format != BinaryFormat::Container {
            return Err(CoreError::NotImplemented {
                feature: "backward navigation in logger-form traces".into(),
            }
            .into());
        }
        if self.offset < rvtrace_core::CycleView::MIN_SIZE {
            return Err(CoreError::Corruption {
                at_offset: Some(self.offset),
                reason: "no previous cycle before the start of the trace".into(),
            }
            .into());
        }

        let footer_pos = (self.offset - FOOTER_SIZE) as usize;
        let header_offset = rvtrace_core::CycleView::read_footer_back_pointer(&self.buffer, footer_pos);
        let prev_size = header_offset + FOOTER_SIZE;
        let new_offset = self.offset - prev_size;
        if new_offset < 0 {
            return Err(CoreError::Corruption {
                at_offset: Some(new_offset),
                reason: "previous footer back-pointer underflows buffer start".into(),
            }
            .into());
        }
        self.offset = new_offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvtrace_core::{BasicInfo, Cycle, CycleBuilder, CycleConfig, NodeKind};
    use std::io::Write;

    fn one_cycle(cycle: u32) -> Vec<u8> {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        b.set_basic_info(BasicInfo { cycle, xlen: 32, pc: 0 }).unwrap();
        b.into_bytes()
    }

    #[test]
    fn reads_whole_file_and_walks_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tbin");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&one_cycle(0)).unwrap();
        f.write_all(&one_cycle(1)).unwrap();
        drop(f);

        let mut reader = TraceFileReader::open(&path, BinaryFormat::Container).unwrap();
        assert!(reader.is_begin());
        assert_eq!(
            reader.current_cycle().unwrap().unwrap().cycle_index(),
            0
        );
        reader.next().unwrap();
        assert_eq!(
            reader.current_cycle().unwrap().unwrap().cycle_index(),
            1
        );
        reader.next().unwrap();
        assert!(reader.is_end());
        assert!(reader.next().is_err());
    }

    #[test]
    fn missing_file_is_file_open_failure() {
        let err = TraceFileReader::open("/nonexistent/path.tbin", BinaryFormat::Container).unwrap_err();
        assert!(matches!(err, Error::FileOpenFailure { .. }));
    }

    #[test]
    fn backward_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tbin");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&one_cycle(5)).unwrap();
        f.write_all(&one_cycle(6)).unwrap();
        drop(f);

        let mut reader = TraceFileReader::open(&path, BinaryFormat::Container).unwrap();
        reader.next().unwrap();
        assert_eq!(reader.current_cycle().unwrap().unwrap().cycle_index(), 6);
        reader.previous().unwrap();
        assert_eq!(reader.current_cycle().unwrap().unwrap().cycle_index(), 5);
    }
}
