//! Trace reader — memory. A forward (and, for container-form traces,
//! backward) cursor over a byte buffer holding a concatenation of
//! same-form cycles.
//!
//! Grounded on `TraceBinaryMemoryReaderImpl.cpp`: `IsEnd` iff
//! `offset == bufferSize`; `Next` advances by the current cycle's size and
//! raises corruption if the new offset overshoots the buffer without
//! landing exactly on its end.

use tracing::{debug, warn};

use rvtrace_core::Error as CoreError;

use crate::binary::{BinaryCycle, BinaryFormat};
use crate::error::{Error, Result};

const FOOTER_SIZE: i64 = 8;

/// Forward cursor over an in-memory trace buffer. The buffer is borrowed,
/// not owned — [`crate::file_reader::TraceFileReader`] owns it and
/// delegates here.
pub struct TraceMemoryReader<'a> {
    buffer: &'a [u8],
    format: BinaryFormat,
    offset: i64,
    current: Option<BinaryCycle<'a>>,
}

impl<'a> TraceMemoryReader<'a> {
    pub fn new(buffer: &'a [u8], format: BinaryFormat) -> Result<Self> {
        let min_size: i64 = match format {
            BinaryFormat::Container => rvtrace_core::CycleView::MIN_SIZE,
            BinaryFormat::Logger => 8,
        };
        if !buffer.is_empty() && (buffer.len() as i64) < min_size {
            return Err(CoreError::Corruption {
                at_offset: Some(0),
                reason: "buffer smaller than minimum cycle size".into(),
            }
            .into());
        }

        let current = if buffer.is_empty() {
            None
        } else {
            Some(BinaryCycle::parse(buffer, format)?)
        };

        Ok(Self {
            buffer,
            format,
            offset: 0,
            current,
        })
    }

    /// Auto-detects the binary form by peeking the buffer, per
    /// [`BinaryFormat::sniff`].
    pub fn new_sniffed(buffer: &'a [u8]) -> Result<Self> {
        Self::new(buffer, BinaryFormat::sniff(buffer))
    }

    pub fn format(&self) -> BinaryFormat {
        self.format
    }

    pub fn is_begin(&self) -> bool {
        self.offset == 0
    }

    pub fn is_end(&self) -> bool {
        self.offset == self.buffer.len() as i64
    }

    pub fn current_cycle(&self) -> Option<&BinaryCycle<'a>> {
        self.current.as_ref()
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn next(&mut self) -> Result<()> {
        let cycle = self.current.as_ref().ok_or_else(|| CoreError::Corruption {
            at_offset: Some(self.offset),
            reason: "next() called past the end of the trace".into(),
        })?;
        let size = cycle.size();
        let new_offset = self.offset + size;

        debug!(from = self.offset, to = new_offset, "advancing trace cursor");

        if new_offset > self.buffer.len() as i64 {
            return Err(CoreError::Corruption {
                at_offset: Some(new_offset),
                reason: "advanced offset past end of buffer".into(),
            }
            .into());
        }

        self.offset = new_offset;
        if self.is_end() {
            self.current = None;
        } else {
            self.current = Some(BinaryCycle::parse(&self.buffer[self.offset as usize..], self.format)?);
        }
        Ok(())
    }

    /// Backward navigation via the container form's footer back-pointer.
    /// Not available for logger-form traces (see spec's append-only
    /// logger non-goal).
    pub fn previous(&mut self) -> Result<()> {
        if self.format != BinaryFormat::Container {
            warn!("previous() requested on a logger-form trace");
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
        let header_offset = rvtrace_core::CycleView::read_footer_back_pointer(self.buffer, footer_pos);
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
        self.current = Some(BinaryCycle::parse(&self.buffer[self.offset as usize..], self.format)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvtrace_core::{BasicInfo, CycleBuilder, CycleConfig, NodeKind};

    fn one_cycle(cycle: u32) -> Vec<u8> {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        b.set_basic_info(BasicInfo { cycle, xlen: 32, pc: 0 }).unwrap();
        b.into_bytes()
    }

    #[test]
    fn visits_k_cycles_then_corrupts() {
        let mut buf = Vec::new();
        buf.extend(one_cycle(0));
        buf.extend(one_cycle(1));

        let mut reader = TraceMemoryReader::new(&buf, BinaryFormat::Container).unwrap();
        assert!(reader.is_begin());
        assert!(!reader.is_end());
        assert_eq!(reader.current_cycle().unwrap().cycle_index(), 0);

        reader.next().unwrap();
        assert!(!reader.is_end());
        assert_eq!(reader.current_cycle().unwrap().cycle_index(), 1);

        reader.next().unwrap();
        assert!(reader.is_end());

        assert!(reader.next().is_err());
    }

    #[test]
    fn too_small_buffer_is_corruption() {
        let tiny = [0u8; 4];
        assert!(TraceMemoryReader::new(&tiny, BinaryFormat::Container).is_err());
    }

    #[test]
    fn backward_navigation_container_form() {
        let mut buf = Vec::new();
        buf.extend(one_cycle(10));
        buf.extend(one_cycle(11));

        let mut reader = TraceMemoryReader::new(&buf, BinaryFormat::Container).unwrap();
        reader.next().unwrap();
        assert_eq!(reader.current_cycle().unwrap().cycle_index(), 11);

        reader.previous().unwrap();
        assert_eq!(reader.current_cycle().unwrap().cycle_index(), 10);
    }
}
