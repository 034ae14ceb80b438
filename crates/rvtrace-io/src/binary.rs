//! The binary-form cycle: a container-form or logger-form cycle borrowed
//! from a trace buffer, unified behind `rvtrace_core::Cycle`.
//!
//! A single trace is homogeneous (all shards from one producer use one
//! form), but the reader doesn't assume which: [`BinaryFormat::sniff`]
//! peeks the first node id, matching the source's own container-vs-logger
//! split between `BinaryCycle` and `BinaryCycleLogger`.

use rvtrace_core::{Cycle, ContainerCycle, CycleView, LoggerCycle, LoggerNodeId, Result};

/// Which encoding a binary trace buffer uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryFormat {
    /// Random-access container form (header + meta table + payloads + footer).
    Container,
    /// Append-only TLV logger form (Basic ... Break).
    Logger,
}

impl BinaryFormat {
    /// Peeks the first two bytes of a buffer to guess its form: a logger
    /// cycle always starts with the ASCII id `BA`; a container cycle's
    /// first 8 bytes are the low half of `footerOffset`, which for any
    /// cycle under ~64KiB would coincidentally read as `BA` only if its
    /// footer offset equals exactly 0x4142 — vanishingly unlikely for a
    /// real layout, so this heuristic is reliable in practice.
    pub fn sniff(data: &[u8]) -> Self {
        if data.len() >= 2 {
            let raw = u16::from_le_bytes([data[0], data[1]]);
            if LoggerNodeId::from_raw(raw) == Some(LoggerNodeId::Basic) {
                return Self::Logger;
            }
        }
        Self::Container
    }
}

/// A cycle borrowed from a binary trace buffer, in whichever form that
/// trace uses.
pub enum BinaryCycle<'a> {
    Container(ContainerCycle<'a>),
    Logger(LoggerCycle<'a>),
}

impl<'a> BinaryCycle<'a> {
    /// Parses exactly one cycle starting at the front of `data`, in the
    /// given form. `data` may contain more than one cycle; use
    /// [`BinaryCycle::size`] to find where the next one starts.
    pub fn parse(data: &'a [u8], format: BinaryFormat) -> Result<Self> {
        match format {
            BinaryFormat::Container => Ok(Self::Container(ContainerCycle::new(CycleView::new(data)?))),
            BinaryFormat::Logger => Ok(Self::Logger(LoggerCycle::parse(data)?)),
        }
    }

    /// Total byte length of this cycle within the buffer it was parsed
    /// from.
    pub fn size(&self) -> i64 {
        match self {
            Self::Container(c) => c.view().cycle_size(),
            Self::Logger(c) => c.size() as i64,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerCycle<'a>> {
        match self {
            Self::Container(c) => Some(c),
            Self::Logger(_) => None,
        }
    }
}

impl<'a> Cycle for BinaryCycle<'a> {
    fn cycle_index(&self) -> u32 {
        match self {
            Self::Container(c) => c.cycle_index(),
            Self::Logger(c) => c.cycle_index(),
        }
    }

    fn xlen(&self) -> u32 {
        match self {
            Self::Container(c) => c.xlen(),
            Self::Logger(c) => c.xlen(),
        }
    }

    fn pc(&self, physical: bool) -> Result<u64> {
        match self {
            Self::Container(c) => c.pc(physical),
            Self::Logger(c) => c.pc(physical),
        }
    }

    fn has_int_reg(&self) -> bool {
        match self {
            Self::Container(c) => c.has_int_reg(),
            Self::Logger(c) => c.has_int_reg(),
        }
    }

    fn has_fp_reg(&self) -> bool {
        match self {
            Self::Container(c) => c.has_fp_reg(),
            Self::Logger(c) => c.has_fp_reg(),
        }
    }

    fn has_io(&self) -> bool {
        match self {
            Self::Container(c) => c.has_io(),
            Self::Logger(c) => c.has_io(),
        }
    }

    fn op_event_count(&self) -> usize {
        match self {
            Self::Container(c) => c.op_event_count(),
            Self::Logger(c) => c.op_event_count(),
        }
    }

    fn memory_event_count(&self) -> usize {
        match self {
            Self::Container(c) => c.memory_event_count(),
            Self::Logger(c) => c.memory_event_count(),
        }
    }

    fn trap_event_count(&self) -> usize {
        match self {
            Self::Container(c) => c.trap_event_count(),
            Self::Logger(c) => c.trap_event_count(),
        }
    }

    fn int_reg(&self, i: usize) -> Result<u64> {
        match self {
            Self::Container(c) => c.int_reg(i),
            Self::Logger(c) => c.int_reg(i),
        }
    }

    fn fp_reg(&self, i: usize) -> Result<u64> {
        match self {
            Self::Container(c) => c.fp_reg(i),
            Self::Logger(c) => c.fp_reg(i),
        }
    }

    fn copy_io(&self) -> Result<rvtrace_core::IoState> {
        match self {
            Self::Container(c) => c.copy_io(),
            Self::Logger(c) => c.copy_io(),
        }
    }

    fn copy_op_event(&self, i: usize) -> Result<rvtrace_core::OpEvent> {
        match self {
            Self::Container(c) => c.copy_op_event(i),
            Self::Logger(c) => c.copy_op_event(i),
        }
    }

    fn copy_memory_event(&self, i: usize) -> Result<rvtrace_core::MemoryEvent> {
        match self {
            Self::Container(c) => c.copy_memory_event(i),
            Self::Logger(c) => c.copy_memory_event(i),
        }
    }

    fn copy_trap_event(&self, i: usize) -> Result<rvtrace_core::TrapEvent> {
        match self {
            Self::Container(c) => c.copy_trap_event(i),
            Self::Logger(c) => c.copy_trap_event(i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_logger_by_basic_id() {
        let mut logger = rvtrace_core::CycleLogger::with_default_capacity(0, 32, 0).unwrap();
        logger.add_io(rvtrace_core::IoState { host_io: 1 }).unwrap();
        let bytes = logger.finish().unwrap();
        assert_eq!(BinaryFormat::sniff(&bytes), BinaryFormat::Logger);
    }

    #[test]
    fn sniff_container_by_default() {
        let mut cfg = rvtrace_core::CycleConfig::new();
        cfg.set_count(rvtrace_core::NodeKind::BasicInfo, 1);
        let b = rvtrace_core::CycleBuilder::new(&cfg).unwrap();
        let bytes = b.into_bytes();
        assert_eq!(BinaryFormat::sniff(&bytes), BinaryFormat::Container);
    }
}
