//! The unified cycle interface: a single capability trait
//! implemented by the container-form and logger-form variants. The
//! text-form variant lives in `rvtrace-io` (it needs the text grammar)
//! and implements the same trait.

use crate::byteio::{read_u16, read_u32};
use crate::error::{Error, Result};
use crate::node::{BasicInfo, IoState, LoggerNodeId, MemoryEvent, OpEvent, TrapEvent};
use crate::view::CycleView;

/// Polymorphic read surface over a cycle, regardless of its backing
/// encoding.
pub trait Cycle {
    fn cycle_index(&self) -> u32;
    fn xlen(&self) -> u32;
    /// `physical = false` selects the virtual PC, `true` the physical PC.
    fn pc(&self, physical: bool) -> Result<u64>;

    fn has_int_reg(&self) -> bool;
    fn has_fp_reg(&self) -> bool;
    fn has_io(&self) -> bool;

    fn op_event_count(&self) -> usize;
    fn memory_event_count(&self) -> usize;
    fn trap_event_count(&self) -> usize;

    fn int_reg(&self, i: usize) -> Result<u64>;
    fn fp_reg(&self, i: usize) -> Result<u64>;

    fn copy_io(&self) -> Result<IoState>;
    fn copy_op_event(&self, i: usize) -> Result<OpEvent>;
    fn copy_memory_event(&self, i: usize) -> Result<MemoryEvent>;
    fn copy_trap_event(&self, i: usize) -> Result<TrapEvent>;
}

fn check_index(i: usize, n: usize) -> Result<()> {
    if i >= n {
        return Err(Error::IndexOutOfRange {
            i: i as i32,
            n: n as i32,
        });
    }
    Ok(())
}

/// Container-form cycle, adapting [`CycleView`] to the unified trait.
///
/// Resolves the mixed-PC open question: `xlen()`/`pc()` read
/// whichever of `Pc32`/`Pc64` is present (construction already forbids
/// both); `BasicInfo.xlen` is used only as a fallback when neither is
/// present.
pub struct ContainerCycle<'a> {
    view: CycleView<'a>,
}

impl<'a> ContainerCycle<'a> {
    pub fn new(view: CycleView<'a>) -> Self {
        Self { view }
    }

    pub fn view(&self) -> &CycleView<'a> {
        &self.view
    }
}

impl<'a> Cycle for ContainerCycle<'a> {
    fn cycle_index(&self) -> u32 {
        self.view.basic_info().map(|b| b.cycle).unwrap_or(0)
    }

    fn xlen(&self) -> u32 {
        if self.view.node_count(crate::node::NodeKind::Pc64) > 0 {
            64
        } else if self.view.node_count(crate::node::NodeKind::Pc32) > 0 {
            32
        } else {
            self.view.basic_info().map(|b| b.xlen).unwrap_or(32)
        }
    }

    fn pc(&self, physical: bool) -> Result<u64> {
        if let Ok(pair) = self.view.pc64() {
            return Ok(if physical { pair.phys } else { pair.virt });
        }
        if let Ok(pair) = self.view.pc32() {
            return Ok(if physical { pair.phys } else { pair.virt });
        }
        Ok(self.view.basic_info()?.pc)
    }

    fn has_int_reg(&self) -> bool {
        self.view.node_count(crate::node::NodeKind::IntReg32) > 0
            || self.view.node_count(crate::node::NodeKind::IntReg64) > 0
    }

    fn has_fp_reg(&self) -> bool {
        self.view.node_count(crate::node::NodeKind::FpReg) > 0
    }

    fn has_io(&self) -> bool {
        self.view.node_count(crate::node::NodeKind::Io) > 0
    }

    fn op_event_count(&self) -> usize {
        // OpEvent has no container-form counterpart.
        0
    }

    fn memory_event_count(&self) -> usize {
        self.view.node_count(crate::node::NodeKind::MemoryAccess) as usize
    }

    fn trap_event_count(&self) -> usize {
        (self.view.node_count(crate::node::NodeKind::Trap32)
            + self.view.node_count(crate::node::NodeKind::Trap64)) as usize
    }

    fn int_reg(&self, i: usize) -> Result<u64> {
        if let Ok(regs) = self.view.int_reg64() {
            check_index(i, 32)?;
            return Ok(regs[i]);
        }
        let regs = self.view.int_reg32()?;
        check_index(i, 32)?;
        Ok(u64::from(regs[i]))
    }

    fn fp_reg(&self, i: usize) -> Result<u64> {
        let fp = self.view.fp_reg()?;
        check_index(i, 32)?;
        Ok(crate::node::FpRegValue::as_u64(fp.slot(i)))
    }

    fn copy_io(&self) -> Result<IoState> {
        self.view.io()
    }

    fn copy_op_event(&self, i: usize) -> Result<OpEvent> {
        Err(Error::IndexOutOfRange { i: i as i32, n: 0 })
    }

    fn copy_memory_event(&self, i: usize) -> Result<MemoryEvent> {
        self.view.memory_access(i as i32)
    }

    fn copy_trap_event(&self, i: usize) -> Result<TrapEvent> {
        if self.view.node_count(crate::node::NodeKind::Trap64) > 0 {
            self.view.trap64(i as i32)
        } else {
            self.view.trap32(i as i32)
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct LoggerSlot {
    id: LoggerNodeId,
    offset: usize,
    size: usize,
}

/// Logger-form cycle: walks the TLV stream once at construction and
/// memoizes node offsets, so subsequent accessors are direct index
/// lookups.
pub struct LoggerCycle<'a> {
    data: &'a [u8],
    basic: BasicInfo,
    slots: Vec<LoggerSlot>,
    /// total bytes consumed by this cycle, header+payload of every node
    /// up to and including Break.
    size: usize,
}

impl<'a> LoggerCycle<'a> {
    /// Parses one cycle starting at the front of `data`. Returns the
    /// cycle and does not assume `data` contains only this one cycle;
    /// callers use `size()` to find where the next cycle starts.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut offset = 0usize;
        let mut slots = Vec::new();
        let mut basic = None;

        loop {
            if offset + 8 > data.len() {
                return Err(Error::Corruption {
                    at_offset: Some(offset as i64),
                    reason: "truncated node header".into(),
                });
            }
            let raw_id = read_u16(data, offset);
            let id = LoggerNodeId::from_raw(raw_id).ok_or_else(|| Error::Corruption {
                at_offset: Some(offset as i64),
                reason: format!("unknown logger node id 0x{raw_id:04x}"),
            })?;
            let size = read_u32(data, offset + 4) as usize;
            if offset + 8 + size > data.len() {
                return Err(Error::Corruption {
                    at_offset: Some(offset as i64),
                    reason: "node payload runs past buffer".into(),
                });
            }

            if basic.is_none() {
                if id != LoggerNodeId::Basic {
                    return Err(Error::Corruption {
                        at_offset: Some(offset as i64),
                        reason: "logger cycle must begin with Basic".into(),
                    });
                }
                basic = Some(BasicInfo::decode(&data[offset + 8..offset + 8 + size]));
            } else {
                slots.push(LoggerSlot {
                    id,
                    offset: offset + 8,
                    size,
                });
            }

            offset += 8 + size;
            if id == LoggerNodeId::Break {
                break;
            }
        }

        Ok(Self {
            data,
            basic: basic.expect("loop only exits after Basic is set"),
            slots,
            size: offset,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn of(&self, id: LoggerNodeId) -> Vec<&LoggerSlot> {
        self.slots.iter().filter(|s| s.id == id).collect()
    }

    fn nth(&self, id: LoggerNodeId, i: usize) -> Result<&'a [u8]> {
        let matches = self.of(id);
        let slot = matches.get(i).ok_or(Error::IndexOutOfRange {
            i: i as i32,
            n: matches.len() as i32,
        })?;
        Ok(&self.data[slot.offset..slot.offset + slot.size])
    }
}

impl<'a> Cycle for LoggerCycle<'a> {
    fn cycle_index(&self) -> u32 {
        self.basic.cycle
    }

    fn xlen(&self) -> u32 {
        self.basic.xlen
    }

    /// The logger's Basic node carries a single PC; both virtual and
    /// physical reads return it (no separate physical field exists for
    /// a live-producer stream).
    fn pc(&self, _physical: bool) -> Result<u64> {
        Ok(self.basic.pc)
    }

    fn has_int_reg(&self) -> bool {
        !self.of(LoggerNodeId::IntReg).is_empty()
    }

    fn has_fp_reg(&self) -> bool {
        !self.of(LoggerNodeId::FpReg).is_empty()
    }

    fn has_io(&self) -> bool {
        !self.of(LoggerNodeId::Io).is_empty()
    }

    fn op_event_count(&self) -> usize {
        self.of(LoggerNodeId::OpEvent).len()
    }

    fn memory_event_count(&self) -> usize {
        self.of(LoggerNodeId::MemoryEvent).len()
    }

    fn trap_event_count(&self) -> usize {
        self.of(LoggerNodeId::TrapEvent).len()
    }

    fn int_reg(&self, i: usize) -> Result<u64> {
        let bytes = self.nth(LoggerNodeId::IntReg, 0)?;
        let width = bytes.len() / 32;
        check_index(i, 32)?;
        Ok(if width == 8 {
            crate::byteio::read_u64(bytes, i * 8)
        } else {
            u64::from(read_u32(bytes, i * 4))
        })
    }

    fn fp_reg(&self, i: usize) -> Result<u64> {
        let bytes = self.nth(LoggerNodeId::FpReg, 0)?;
        check_index(i, 32)?;
        Ok(crate::node::FpRegValue::as_u64(&bytes[i * 8..i * 8 + 8]))
    }

    fn copy_io(&self) -> Result<IoState> {
        Ok(IoState::decode(self.nth(LoggerNodeId::Io, 0)?))
    }

    fn copy_op_event(&self, i: usize) -> Result<OpEvent> {
        Ok(OpEvent::decode(self.nth(LoggerNodeId::OpEvent, i)?))
    }

    fn copy_memory_event(&self, i: usize) -> Result<MemoryEvent> {
        Ok(MemoryEvent::decode(self.nth(LoggerNodeId::MemoryEvent, i)?))
    }

    fn copy_trap_event(&self, i: usize) -> Result<TrapEvent> {
        let bytes = self.nth(LoggerNodeId::TrapEvent, i)?;
        Ok(if bytes.len() == 24 {
            TrapEvent::decode64(bytes)
        } else {
            TrapEvent::decode32(bytes)
        })
    }
}
