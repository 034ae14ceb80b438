//! Cycle logger — append-only TLV encoding.

use crate::byteio::{write_u16, write_u32};
use crate::error::{Error, Result};
use crate::node::{
    BasicInfo, FpRegValue, IoState, LoggerNodeId, MemoryEvent, OpEvent, TrapEvent,
};

/// The source's hardcoded buffer size, kept as a convenience default
/// ("logger default buffer" open question — callers that need more
/// headroom construct with an explicit capacity instead).
pub const DEFAULT_CAPACITY: u32 = 4096;

/// Append-only TLV cycle encoder. The first node is always `Basic`
/// (written at construction); `finish()` appends `Break` and seals the
/// buffer.
pub struct CycleLogger {
    buf: Vec<u8>,
    capacity: u32,
    finished: bool,
}

impl CycleLogger {
    pub fn new(capacity: u32, cycle: u32, xlen: u32, pc: u64) -> Result<Self> {
        let mut logger = Self {
            buf: Vec::with_capacity(capacity.min(4096) as usize),
            capacity,
            finished: false,
        };
        logger.write_node(LoggerNodeId::Basic, BasicInfo::SIZE as u32, |out| {
            BasicInfo { cycle, xlen, pc }.encode(out);
        })?;
        Ok(logger)
    }

    pub fn with_default_capacity(cycle: u32, xlen: u32, pc: u64) -> Result<Self> {
        Self::new(DEFAULT_CAPACITY, cycle, xlen, pc)
    }

    fn write_node(
        &mut self,
        id: LoggerNodeId,
        size: u32,
        fill: impl FnOnce(&mut [u8]),
    ) -> Result<()> {
        debug_assert!(!self.finished, "add() after finish() is a programmer error");

        let node_total = 8u64 + u64::from(size);
        let new_len = self.buf.len() as u64 + node_total;
        if new_len > u64::from(self.capacity) {
            return Err(Error::BufferOverflow {
                capacity: self.capacity,
            });
        }
        if size > u32::MAX - 8 {
            return Err(Error::Overflow);
        }

        let header_pos = self.buf.len();
        self.buf.resize(header_pos + 8 + size as usize, 0);
        write_u16(&mut self.buf, header_pos, id.raw());
        write_u16(&mut self.buf, header_pos + 2, 0);
        write_u32(&mut self.buf, header_pos + 4, size);
        fill(&mut self.buf[header_pos + 8..header_pos + 8 + size as usize]);
        Ok(())
    }

    pub fn add_int_reg32(&mut self, regs: &[u32; 32]) -> Result<()> {
        self.write_node(LoggerNodeId::IntReg, 128, |out| {
            for (i, r) in regs.iter().enumerate() {
                write_u32(out, i * 4, *r);
            }
        })
    }

    pub fn add_int_reg64(&mut self, regs: &[u64; 32]) -> Result<()> {
        self.write_node(LoggerNodeId::IntReg, 256, |out| {
            for (i, r) in regs.iter().enumerate() {
                crate::byteio::write_u64(out, i * 8, *r);
            }
        })
    }

    pub fn add_fp_reg(&mut self, regs: &[FpRegValue; 32]) -> Result<()> {
        self.write_node(LoggerNodeId::FpReg, 256, |out| {
            for (i, r) in regs.iter().enumerate() {
                r.encode(&mut out[i * 8..i * 8 + 8]);
            }
        })
    }

    pub fn add_io(&mut self, value: IoState) -> Result<()> {
        self.write_node(LoggerNodeId::Io, IoState::SIZE as u32, |out| {
            value.encode(out);
        })
    }

    pub fn add_op_event(&mut self, value: OpEvent) -> Result<()> {
        self.write_node(LoggerNodeId::OpEvent, OpEvent::SIZE as u32, |out| {
            value.encode(out);
        })
    }

    pub fn add_trap32(&mut self, value: TrapEvent) -> Result<()> {
        self.write_node(LoggerNodeId::TrapEvent, 16, |out| value.encode32(out))
    }

    pub fn add_trap64(&mut self, value: TrapEvent) -> Result<()> {
        self.write_node(LoggerNodeId::TrapEvent, 24, |out| value.encode64(out))
    }

    pub fn add_memory_event(&mut self, value: MemoryEvent) -> Result<()> {
        self.write_node(LoggerNodeId::MemoryEvent, MemoryEvent::SIZE as u32, |out| {
            value.encode(out);
        })
    }

    /// Appends the terminating `Break` node and returns the sealed bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.write_node(LoggerNodeId::Break, 0, |_| {})?;
        self.finished = true;
        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_seals_with_basic_and_break() {
        let mut logger = CycleLogger::with_default_capacity(3, 32, 0x8000_0000).unwrap();
        logger.add_io(IoState { host_io: 1 }).unwrap();
        let bytes = logger.finish().unwrap();

        assert_eq!(bytes[0], b'B');
        assert_eq!(bytes[1], b'A');
        let last4 = &bytes[bytes.len() - 8..];
        assert_eq!(last4[0], b'B');
        assert_eq!(last4[1], b'R');
        assert_eq!(crate::byteio::read_u32(last4, 4), 0);
    }

    #[test]
    fn buffer_overflow_when_capacity_too_small_for_basic() {
        // Basic alone is 24 bytes; a 4-byte capacity can't even hold it.
        assert!(matches!(
            CycleLogger::new(4, 0, 32, 0),
            Err(Error::BufferOverflow { .. })
        ));
    }

    #[test]
    fn buffer_overflow_on_later_add() {
        // Room for Basic (24 bytes) but not for a 264-byte FpReg add.
        let mut logger = CycleLogger::new(24, 0, 32, 0).unwrap();
        let err = logger.add_fp_reg(&[FpRegValue::U64(0); 32]).unwrap_err();
        assert!(matches!(err, Error::BufferOverflow { .. }));
    }
}
