//! The node catalog: the fixed enumeration of node kinds and their binary
//! layouts. Builder and view consult this table; nothing else in
//! the crate hardcodes a node's size.

use crate::byteio::{read_u32, read_u64, write_u32, write_u64};
use crate::config::CycleConfig;
use crate::error::{Error, Result};

/// One entry in the closed node-kind enumeration for the container form.
///
/// Declaration order here *is* the meta-table ordering:
/// entries of different kinds appear in this order, entries of the same
/// kind in index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum NodeKind {
    BasicInfo = 0,
    IntReg32 = 1,
    IntReg64 = 2,
    FpReg = 3,
    Pc32 = 4,
    Pc64 = 5,
    Csr32 = 6,
    Csr64 = 7,
    Trap32 = 8,
    Trap64 = 9,
    MemoryAccess = 10,
    Io = 11,
    Memory = 12,
}

/// All container-form kinds, in catalog (= meta-table) order.
pub const ALL_KINDS: [NodeKind; 13] = [
    NodeKind::BasicInfo,
    NodeKind::IntReg32,
    NodeKind::IntReg64,
    NodeKind::FpReg,
    NodeKind::Pc32,
    NodeKind::Pc64,
    NodeKind::Csr32,
    NodeKind::Csr64,
    NodeKind::Trap32,
    NodeKind::Trap64,
    NodeKind::MemoryAccess,
    NodeKind::Io,
    NodeKind::Memory,
];

impl NodeKind {
    /// Numeric tag stored in a `MetaEntry.kind`.
    pub const fn tag(self) -> u32 {
        self as u32
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        ALL_KINDS.into_iter().find(|k| k.tag() == tag)
    }

    /// Whether this kind has a variable (config-dependent) proper size.
    pub const fn is_variable(self) -> bool {
        matches!(self, Self::Csr32 | Self::Csr64 | Self::Memory)
    }

    /// Proper size in bytes for an instance of this kind under `config`.
    ///
    /// Fixed for everything except `Csr32`/`Csr64` (`csr_count * record`)
    /// and `Memory` (`ram_size`).
    pub fn proper_size(self, config: &CycleConfig) -> Result<i64> {
        let size = match self {
            Self::BasicInfo => 16,
            Self::IntReg32 => 32 * 4,
            Self::IntReg64 => 32 * 8,
            Self::FpReg => 32 * 8,
            Self::Pc32 => 8,
            Self::Pc64 => 16,
            Self::Csr32 => i64::from(config.csr_count)
                .checked_mul(8)
                .ok_or(Error::Overflow)?,
            Self::Csr64 => i64::from(config.csr_count)
                .checked_mul(16)
                .ok_or(Error::Overflow)?,
            Self::Trap32 => 16,
            Self::Trap64 => 24,
            Self::MemoryAccess => 32,
            Self::Io => 8,
            Self::Memory => config.ram_size,
        };
        if size > i64::MAX / 2 {
            return Err(Error::Overflow);
        }
        Ok(size)
    }

    /// ASCII two-letter id used by the logger form, if this kind is
    /// representable there. The logger form is narrower than the
    /// container catalog: it has no concept of separate Pc32/Pc64, Csr,
    /// or Memory nodes (see `LoggerNodeId`); `IntReg32`/`IntReg64` and
    /// `Trap32`/`Trap64` collapse to one width-polymorphic logger node
    /// whose size follows the cycle's XLEN.
    pub const fn logger_id(self) -> Option<LoggerNodeId> {
        match self {
            Self::BasicInfo => Some(LoggerNodeId::Basic),
            Self::IntReg32 | Self::IntReg64 => Some(LoggerNodeId::IntReg),
            Self::FpReg => Some(LoggerNodeId::FpReg),
            Self::Io => Some(LoggerNodeId::Io),
            Self::Trap32 | Self::Trap64 => Some(LoggerNodeId::TrapEvent),
            Self::MemoryAccess => Some(LoggerNodeId::MemoryEvent),
            Self::Pc32 | Self::Pc64 | Self::Csr32 | Self::Csr64 | Self::Memory => None,
        }
    }
}

/// Node identifiers used by the logger (TLV) form.
///
/// `OpEvent` has no container-form counterpart: the container catalog
/// (`NodeKind`) never stores an executed-instruction event, only the
/// logger and text forms do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoggerNodeId {
    Basic,
    IntReg,
    FpReg,
    Io,
    OpEvent,
    TrapEvent,
    MemoryEvent,
    Break,
}

impl LoggerNodeId {
    /// 16-bit little-endian ASCII id
    pub const fn raw(self) -> u16 {
        match self {
            Self::Basic => 0x4142,      // "BA"
            Self::IntReg => 0x4e49,     // "IN"
            Self::FpReg => 0x5046,      // "FP"
            Self::Io => 0x4f49,         // "IO"
            Self::OpEvent => 0x504f,    // "OP"
            Self::TrapEvent => 0x5254,  // "TR"
            Self::MemoryEvent => 0x414d, // "MA"
            Self::Break => 0x5242,      // "BR"
        }
    }

    pub fn from_raw(raw: u16) -> Option<Self> {
        [
            Self::Basic,
            Self::IntReg,
            Self::FpReg,
            Self::Io,
            Self::OpEvent,
            Self::TrapEvent,
            Self::MemoryEvent,
            Self::Break,
        ]
        .into_iter()
        .find(|id| id.raw() == raw)
    }
}

/// RISC-V privilege level, used by `OpEvent`/`TrapEvent` payloads.
/// Numeric encoding matches the architecture's own privilege CSR values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PrivilegeLevel {
    User = 0,
    Supervisor = 1,
    Reserved = 2,
    Machine = 3,
}

impl PrivilegeLevel {
    pub const fn from_u32(v: u32) -> Self {
        match v & 0x3 {
            0 => Self::User,
            1 => Self::Supervisor,
            3 => Self::Machine,
            _ => Self::Reserved,
        }
    }
}

/// Access kind carried by a `MemoryAccess`/`MemoryEvent` node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum MemoryAccessType {
    Instruction = 0,
    Load = 1,
    Store = 2,
}

impl MemoryAccessType {
    pub const fn from_u32(v: u32) -> Self {
        match v {
            0 => Self::Instruction,
            2 => Self::Store,
            _ => Self::Load,
        }
    }

    pub const fn is_load(self) -> bool {
        matches!(self, Self::Instruction | Self::Load)
    }

    pub const fn is_store(self) -> bool {
        matches!(self, Self::Store)
    }
}

/// Trap kind carried by a `Trap32`/`Trap64`/`TrapEvent` node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TrapType {
    Interrupt = 0,
    Exception = 1,
}

impl TrapType {
    pub const fn from_u32(v: u32) -> Self {
        if v == 0 { Self::Interrupt } else { Self::Exception }
    }
}

/// Decoded `BasicInfo` payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BasicInfo {
    pub cycle: u32,
    pub xlen: u32,
    pub pc: u64,
}

impl BasicInfo {
    pub const SIZE: usize = 16;

    pub fn encode(self, out: &mut [u8]) {
        write_u32(out, 0, self.cycle);
        write_u32(out, 4, self.xlen);
        write_u64(out, 8, self.pc);
    }

    pub fn decode(data: &[u8]) -> Self {
        Self {
            cycle: read_u32(data, 0),
            xlen: read_u32(data, 4),
            pc: read_u64(data, 8),
        }
    }
}

/// Decoded `Pc32`/`Pc64` payload (virtual, physical), widened to u64.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcPair {
    pub virt: u64,
    pub phys: u64,
}

impl PcPair {
    pub fn encode32(self, out: &mut [u8]) {
        write_u32(out, 0, self.virt as u32);
        write_u32(out, 4, self.phys as u32);
    }

    pub fn decode32(data: &[u8]) -> Self {
        Self {
            virt: u64::from(read_u32(data, 0)),
            phys: u64::from(read_u32(data, 4)),
        }
    }

    pub fn encode64(self, out: &mut [u8]) {
        write_u64(out, 0, self.virt);
        write_u64(out, 8, self.phys);
    }

    pub fn decode64(data: &[u8]) -> Self {
        Self {
            virt: read_u64(data, 0),
            phys: read_u64(data, 8),
        }
    }
}

/// Decoded `Trap32`/`Trap64` payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapEvent {
    pub trap_type: TrapType,
    pub from: PrivilegeLevel,
    pub to: PrivilegeLevel,
    pub cause: u32,
    pub value: u64,
}

impl TrapEvent {
    pub fn encode32(self, out: &mut [u8]) {
        write_u32(out, 0, self.trap_type as u32);
        out[4] = self.from as u8;
        out[5] = self.to as u8;
        write_u32(out, 8, self.cause);
        write_u32(out, 12, self.value as u32);
    }

    pub fn decode32(data: &[u8]) -> Self {
        Self {
            trap_type: TrapType::from_u32(read_u32(data, 0)),
            from: PrivilegeLevel::from_u32(u32::from(data[4])),
            to: PrivilegeLevel::from_u32(u32::from(data[5])),
            cause: read_u32(data, 8),
            value: u64::from(read_u32(data, 12)),
        }
    }

    pub fn encode64(self, out: &mut [u8]) {
        write_u32(out, 0, self.trap_type as u32);
        out[4] = self.from as u8;
        out[5] = self.to as u8;
        write_u32(out, 8, self.cause);
        write_u64(out, 16, self.value);
    }

    pub fn decode64(data: &[u8]) -> Self {
        Self {
            trap_type: TrapType::from_u32(read_u32(data, 0)),
            from: PrivilegeLevel::from_u32(u32::from(data[4])),
            to: PrivilegeLevel::from_u32(u32::from(data[5])),
            cause: read_u32(data, 8),
            value: read_u64(data, 16),
        }
    }
}

/// Decoded `MemoryAccess`/`MemoryEvent` payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryEvent {
    pub access_type: MemoryAccessType,
    pub size: u32,
    pub value: u64,
    pub vaddr: u64,
    pub paddr: u64,
}

impl MemoryEvent {
    pub const SIZE: usize = 32;

    pub fn encode(self, out: &mut [u8]) {
        write_u32(out, 0, self.access_type as u32);
        write_u32(out, 4, self.size);
        write_u64(out, 8, self.value);
        write_u64(out, 16, self.vaddr);
        write_u64(out, 24, self.paddr);
    }

    pub fn decode(data: &[u8]) -> Self {
        Self {
            access_type: MemoryAccessType::from_u32(read_u32(data, 0)),
            size: read_u32(data, 4),
            value: read_u64(data, 8),
            vaddr: read_u64(data, 16),
            paddr: read_u64(data, 24),
        }
    }

    /// Whether this event's address range `[vaddr/paddr, +size)` contains
    /// `address` (memory-access filter).
    pub fn contains(&self, address: u64, physical: bool) -> bool {
        let base = if physical { self.paddr } else { self.vaddr };
        address >= base && address < base + u64::from(self.size)
    }
}

/// Decoded `Io` payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoState {
    pub host_io: u32,
}

impl IoState {
    pub const SIZE: usize = 8;

    pub fn encode(self, out: &mut [u8]) {
        write_u32(out, 0, self.host_io);
        write_u32(out, 4, 0);
    }

    pub fn decode(data: &[u8]) -> Self {
        Self {
            host_io: read_u32(data, 0),
        }
    }
}

/// One 8-byte floating-point register slot, readable three ways
/// depending on what the producer last wrote (`FpRegUnion`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FpRegValue {
    U64(u64),
    F32(f32),
    F64(f64),
}

impl FpRegValue {
    pub fn encode(self, out: &mut [u8]) {
        match self {
            Self::U64(v) => write_u64(out, 0, v),
            Self::F32(v) => {
                write_u32(out, 0, v.to_bits());
                write_u32(out, 4, 0);
            }
            Self::F64(v) => write_u64(out, 0, v.to_bits()),
        }
    }

    /// Read back as the raw 64-bit bit pattern, regardless of which
    /// variant was written (the union is read via `as_u64` unless the
    /// caller knows the original float width).
    pub fn as_u64(data: &[u8]) -> u64 {
        read_u64(data, 0)
    }

    pub fn as_f32(data: &[u8]) -> f32 {
        f32::from_bits(read_u32(data, 0))
    }

    pub fn as_f64(data: &[u8]) -> f64 {
        f64::from_bits(read_u64(data, 0))
    }
}

/// Decoded `OpEvent` payload (logger/text form only).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpEvent {
    pub insn: u32,
    pub priv_level: PrivilegeLevel,
}

impl OpEvent {
    pub const SIZE: usize = 8;

    pub fn encode(self, out: &mut [u8]) {
        write_u32(out, 0, self.insn);
        write_u32(out, 4, self.priv_level as u32);
    }

    pub fn decode(data: &[u8]) -> Self {
        Self {
            insn: read_u32(data, 0),
            priv_level: PrivilegeLevel::from_u32(read_u32(data, 4)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_order_matches_catalog() {
        assert_eq!(ALL_KINDS[0], NodeKind::BasicInfo);
        assert_eq!(ALL_KINDS[12], NodeKind::Memory);
    }

    #[test]
    fn fixed_sizes() {
        let cfg = CycleConfig::new();
        assert_eq!(NodeKind::BasicInfo.proper_size(&cfg).unwrap(), 16);
        assert_eq!(NodeKind::IntReg32.proper_size(&cfg).unwrap(), 128);
        assert_eq!(NodeKind::IntReg64.proper_size(&cfg).unwrap(), 256);
        assert_eq!(NodeKind::FpReg.proper_size(&cfg).unwrap(), 256);
        assert_eq!(NodeKind::Pc32.proper_size(&cfg).unwrap(), 8);
        assert_eq!(NodeKind::Pc64.proper_size(&cfg).unwrap(), 16);
        assert_eq!(NodeKind::Trap32.proper_size(&cfg).unwrap(), 16);
        assert_eq!(NodeKind::Trap64.proper_size(&cfg).unwrap(), 24);
        assert_eq!(NodeKind::MemoryAccess.proper_size(&cfg).unwrap(), 32);
        assert_eq!(NodeKind::Io.proper_size(&cfg).unwrap(), 8);
    }

    #[test]
    fn variable_sizes() {
        let mut cfg = CycleConfig::new();
        cfg.csr_count = 4;
        cfg.ram_size = 1024;
        assert_eq!(NodeKind::Csr32.proper_size(&cfg).unwrap(), 32);
        assert_eq!(NodeKind::Csr64.proper_size(&cfg).unwrap(), 64);
        assert_eq!(NodeKind::Memory.proper_size(&cfg).unwrap(), 1024);
    }

    #[test]
    fn logger_id_roundtrip() {
        assert_eq!(LoggerNodeId::Basic.raw(), 0x4142);
        assert_eq!(LoggerNodeId::from_raw(0x4142), Some(LoggerNodeId::Basic));
        assert_eq!(LoggerNodeId::from_raw(0x5242), Some(LoggerNodeId::Break));
        assert_eq!(LoggerNodeId::from_raw(0xffff), None);
    }

    #[test]
    fn basic_info_encode_decode() {
        let mut buf = [0u8; BasicInfo::SIZE];
        let b = BasicInfo {
            cycle: 7,
            xlen: 64,
            pc: 0x8000_0000_0000,
        };
        b.encode(&mut buf);
        assert_eq!(BasicInfo::decode(&buf), b);
    }

    #[test]
    fn memory_event_contains() {
        let ev = MemoryEvent {
            access_type: MemoryAccessType::Load,
            size: 4,
            value: 0,
            vaddr: 0x1000,
            paddr: 0x9000,
        };
        assert!(ev.contains(0x1000, false));
        assert!(ev.contains(0x1003, false));
        assert!(!ev.contains(0x1004, false));
        assert!(ev.contains(0x9000, true));
    }
}
