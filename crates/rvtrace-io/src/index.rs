//! Trace index reader/writer — a sharded on-disk trace: a text index file
//! naming binary shards (each a logger-form binary trace) and their cycle
//! counts, with a writer that rolls a new shard at a configured cap.
//!
//! Grounded on `TraceIndexWriterImpl.cpp`/`TraceIndexReaderImpl.cpp`: the
//! writer writes each shard's path line the moment it opens the shard, and
//! the cycle-count line only once the shard closes; the reader parses the
//! whole index up front and keeps exactly one shard reader open at a time.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write as _};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::binary::BinaryFormat;
use crate::error::{Error, Result};
use crate::file_reader::TraceFileReader;
use crate::writer::FileTraceWriter;

/// Default per-shard cycle cap, matching the source's own constant.
pub const DEFAULT_MAX_CYCLES_PER_SHARD: u32 = 10_000;

/// One entry of a parsed `.tidx` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub shard_path: PathBuf,
    pub cycle_count: u32,
}

/// Writes a sharded index trace: `<path_base>.tidx` plus
/// `<path_base>.0.tbin`, `<path_base>.1.tbin`, ... logger-form shards.
pub struct IndexTraceWriter {
    path_base: PathBuf,
    index_file: File,
    shard_writer: Option<FileTraceWriter>,
    shard_count: u32,
    cycle_count: u32,
    max_cycles_per_shard: u32,
}

impl IndexTraceWriter {
    pub fn new(path_base: impl Into<PathBuf>) -> Result<Self> {
        Self::with_cap(path_base, DEFAULT_MAX_CYCLES_PER_SHARD)
    }

    pub fn with_cap(path_base: impl Into<PathBuf>, max_cycles_per_shard: u32) -> Result<Self> {
        let path_base = path_base.into();
        let index_path = Self::index_path(&path_base);
        let index_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&index_path)
            .map_err(|source| Error::FileOpenFailure {
                path: index_path.display().to_string(),
                source,
            })?;

        Ok(Self {
            path_base,
            index_file,
            shard_writer: None,
            shard_count: 0,
            cycle_count: 0,
            max_cycles_per_shard,
        })
    }

    fn index_path(path_base: &Path) -> PathBuf {
        let mut p = path_base.as_os_str().to_owned();
        p.push(".tidx");
        PathBuf::from(p)
    }

    fn shard_path(path_base: &Path, shard_count: u32) -> PathBuf {
        let mut p = path_base.as_os_str().to_owned();
        p.push(format!(".{shard_count}.tbin"));
        PathBuf::from(p)
    }

    fn open_shard(&mut self) -> Result<()> {
        let path = Self::shard_path(&self.path_base, self.shard_count);
        self.shard_writer = Some(FileTraceWriter::create(&path)?);
        writeln!(self.index_file, "{}", path.display())?;
        debug!(path = %path.display(), "opened trace shard");
        Ok(())
    }

    /// No-op if no shard is currently open, so closing at a cap boundary
    /// doesn't leave a trailing empty shard behind for `Drop` to close
    /// again — the next shard opens lazily on the next `write`.
    fn close_shard(&mut self) -> Result<()> {
        if self.shard_writer.take().is_none() {
            return Ok(());
        }
        writeln!(self.index_file, "{}", self.cycle_count)?;
        self.shard_count += 1;
        self.cycle_count = 0;
        Ok(())
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.shard_writer.is_none() {
            self.open_shard()?;
        }
        self.shard_writer
            .as_mut()
            .expect("just opened above")
            .write(bytes)?;
        self.cycle_count += 1;

        if self.cycle_count == self.max_cycles_per_shard {
            self.close_shard()?;
        }
        Ok(())
    }
}

impl Drop for IndexTraceWriter {
    fn drop(&mut self) {
        let _ = self.close_shard();
    }
}

/// Reads a sharded index trace, parsed into entries at construction, with
/// exactly one shard's [`TraceFileReader`] live at a time.
pub struct IndexTraceReader {
    entries: Vec<IndexEntry>,
    index: usize,
    current: Option<TraceFileReader>,
}

impl IndexTraceReader {
    pub fn open(index_path: impl AsRef<Path>) -> Result<Self> {
        let path = index_path.as_ref();
        let file = File::open(path).map_err(|source| Error::FileOpenFailure {
            path: path.display().to_string(),
            source,
        })?;
        let entries = Self::parse_index(BufReader::new(file))?;

        let mut reader = Self {
            entries,
            index: 0,
            current: None,
        };
        reader.open_current_shard()?;
        Ok(reader)
    }

    fn parse_index(reader: impl BufRead) -> Result<Vec<IndexEntry>> {
        let mut lines = reader.lines();
        let mut entries = Vec::new();
        loop {
            let Some(path_line) = lines.next() else {
                break;
            };
            let path_line = path_line?;
            let Some(count_line) = lines.next() else {
                break;
            };
            let count_line = count_line?;
            let cycle_count = count_line.trim().parse::<u32>().unwrap_or(0);
            entries.push(IndexEntry {
                shard_path: PathBuf::from(path_line),
                cycle_count,
            });
        }
        Ok(entries)
    }

    fn open_current_shard(&mut self) -> Result<()> {
        if self.index >= self.entries.len() {
            self.current = None;
            return Ok(());
        }
        let path = &self.entries[self.index].shard_path;
        self.current = Some(TraceFileReader::open(path, BinaryFormat::Logger)?);
        Ok(())
    }

    pub fn is_end(&self) -> bool {
        self.index >= self.entries.len()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn current_cycle(&self) -> Option<Result<crate::binary::BinaryCycle<'_>>> {
        self.current.as_ref()?.current_cycle()
    }

    pub fn next(&mut self) -> Result<()> {
        let reader = self
            .current
            .as_mut()
            .expect("next() called with no active shard");
        reader.next()?;
        if reader.is_end() {
            self.index += 1;
            self.open_current_shard()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvtrace_core::{Cycle, CycleLogger, IoState};

    fn cycle_bytes(cycle: u32) -> Vec<u8> {
        let mut logger = CycleLogger::with_default_capacity(cycle, 32, 0).unwrap();
        logger.add_io(IoState { host_io: 1 }).unwrap();
        logger.finish().unwrap()
    }

    #[test]
    fn round_trip_with_rollover() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("t");

        {
            let mut writer = IndexTraceWriter::with_cap(&base, 2).unwrap();
            for i in 0..5u32 {
                writer.write(&cycle_bytes(i)).unwrap();
            }
        }

        assert!(base.with_extension("tidx").exists() || dir.path().join("t.tidx").exists());
        assert!(dir.path().join("t.0.tbin").exists());
        assert!(dir.path().join("t.1.tbin").exists());
        assert!(dir.path().join("t.2.tbin").exists());

        let index_path = dir.path().join("t.tidx");
        let reader = IndexTraceReader::open(&index_path).unwrap();
        assert_eq!(
            reader.entries(),
            &[
                IndexEntry {
                    shard_path: dir.path().join("t.0.tbin"),
                    cycle_count: 2
                },
                IndexEntry {
                    shard_path: dir.path().join("t.1.tbin"),
                    cycle_count: 2
                },
                IndexEntry {
                    shard_path: dir.path().join("t.2.tbin"),
                    cycle_count: 1
                },
            ]
        );

        let mut reader = reader;
        let mut seen = Vec::new();
        loop {
            if reader.is_end() {
                break;
            }
            let cycle = reader.current_cycle().unwrap().unwrap();
            seen.push(cycle.cycle_index());
            reader.next().unwrap();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn round_trip_with_exact_multiple_leaves_no_trailing_empty_shard() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("t");

        {
            let mut writer = IndexTraceWriter::with_cap(&base, 2).unwrap();
            for i in 0..4u32 {
                writer.write(&cycle_bytes(i)).unwrap();
            }
        }

        assert!(dir.path().join("t.0.tbin").exists());
        assert!(dir.path().join("t.1.tbin").exists());
        assert!(!dir.path().join("t.2.tbin").exists());

        let index_path = dir.path().join("t.tidx");
        let mut reader = IndexTraceReader::open(&index_path).unwrap();
        assert_eq!(
            reader.entries(),
            &[
                IndexEntry {
                    shard_path: dir.path().join("t.0.tbin"),
                    cycle_count: 2
                },
                IndexEntry {
                    shard_path: dir.path().join("t.1.tbin"),
                    cycle_count: 2
                },
            ]
        );

        let mut seen = Vec::new();
        loop {
            if reader.is_end() {
                break;
            }
            let cycle = reader.current_cycle().unwrap().unwrap();
            seen.push(cycle.cycle_index());
            reader.next().unwrap();
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
