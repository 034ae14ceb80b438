//! Cycle view — container form, read-only random access.

use crate::byteio::{read_i64, read_u32};
use crate::error::{Error, Result};
use crate::node::{BasicInfo, IoState, MemoryEvent, NodeKind, PcPair, TrapEvent};

/// A borrowed 32-entry FP register file; each slot reinterpretable as
/// u64/f32/f64 via [`crate::node::FpRegValue`].
pub struct FpRegBytes<'a>(pub &'a [u8]);

impl<'a> FpRegBytes<'a> {
    pub fn slot(&self, i: usize) -> &'a [u8] {
        &self.0[i * 8..i * 8 + 8]
    }
}

const HEADER_SIZE: i64 = 16;
const META_ENTRY_SIZE: i64 = 24;
const FOOTER_SIZE: i64 = 8;

#[derive(Clone, Copy, Debug)]
struct MetaSlot {
    kind: NodeKind,
    offset: i64,
    size: i64,
}

/// Borrows a byte region believed to be a well-formed container cycle.
/// Never mutates, never allocates.
pub struct CycleView<'a> {
    data: &'a [u8],
    metas: Vec<MetaSlot>,
    footer_offset: i64,
}

impl<'a> CycleView<'a> {
    /// The smallest a container cycle (zero nodes) can be.
    pub const MIN_SIZE: i64 = HEADER_SIZE + FOOTER_SIZE;

    pub fn new(data: &'a [u8]) -> Result<Self> {
        if (data.len() as i64) < Self::MIN_SIZE {
            return Err(Error::Corruption {
                at_offset: Some(0),
                reason: "region smaller than header+footer".into(),
            });
        }

        let footer_offset = read_i64(data, 0);
        let meta_count = read_u32(data, 8);

        if footer_offset < HEADER_SIZE || footer_offset + FOOTER_SIZE != data.len() as i64 {
            return Err(Error::Corruption {
                at_offset: Some(0),
                reason: format!(
                    "header footerOffset {footer_offset} inconsistent with region size {}",
                    data.len()
                ),
            });
        }

        let meta_table_end = HEADER_SIZE + i64::from(meta_count) * META_ENTRY_SIZE;
        if meta_table_end > footer_offset {
            return Err(Error::Corruption {
                at_offset: Some(HEADER_SIZE),
                reason: "meta table runs past footer".into(),
            });
        }

        let mut metas = Vec::with_capacity(meta_count as usize);
        for j in 0..meta_count {
            let base = (HEADER_SIZE + i64::from(j) * META_ENTRY_SIZE) as usize;
            let tag = read_u32(data, base);
            let kind = NodeKind::from_tag(tag).ok_or_else(|| Error::Corruption {
                at_offset: Some(base as i64),
                reason: format!("unknown node kind tag {tag}"),
            })?;
            let offset = read_i64(data, base + 8);
            let size = read_i64(data, base + 16);
            if offset < meta_table_end || offset + size > footer_offset {
                return Err(Error::Corruption {
                    at_offset: Some(base as i64),
                    reason: "meta entry payload out of bounds".into(),
                });
            }
            metas.push(MetaSlot { kind, offset, size });
        }

        let footer_back_ptr = read_i64(data, footer_offset as usize);
        if footer_back_ptr != footer_offset {
            return Err(Error::Corruption {
                at_offset: Some(footer_offset),
                reason: "footer back-pointer mismatch".into(),
            });
        }

        Ok(Self {
            data,
            metas,
            footer_offset,
        })
    }

    /// Total size of the cycle this view covers
    pub fn cycle_size(&self) -> i64 {
        self.footer_offset + FOOTER_SIZE
    }

    /// Reads a footer's back-pointer (`headerOffset`, stored as the
    /// distance from the footer back to the start of its cycle) out of
    /// `data` at `footer_pos`, without requiring a full `CycleView` of
    /// that cycle. Used for backward navigation: the caller knows where a
    /// footer ends (the current cycle's start) but not yet where the
    /// previous cycle begins.
    pub fn read_footer_back_pointer(data: &[u8], footer_pos: usize) -> i64 {
        read_i64(data, footer_pos)
    }

    fn slot(&self, kind: NodeKind, index: i32) -> Result<&MetaSlot> {
        self.metas
            .iter()
            .filter(|m| m.kind == kind)
            .nth(index as usize)
            .ok_or(Error::NodeNotFound { kind, index })
    }

    pub fn node_count(&self, kind: NodeKind) -> i32 {
        self.metas.iter().filter(|m| m.kind == kind).count() as i32
    }

    pub fn node_size(&self, kind: NodeKind, index: i32) -> Result<i64> {
        Ok(self.slot(kind, index)?.size)
    }

    pub fn node(&self, kind: NodeKind, index: i32) -> Result<&'a [u8]> {
        let slot = *self.slot(kind, index)?;
        let start = slot.offset as usize;
        let end = start + slot.size as usize;
        Ok(&self.data[start..end])
    }

    fn node_exact(&self, kind: NodeKind, expected: i64) -> Result<&'a [u8]> {
        let bytes = self.node(kind, 0)?;
        if bytes.len() as i64 != expected {
            return Err(Error::SizeMismatch {
                kind,
                expected,
                actual: bytes.len() as i64,
            });
        }
        Ok(bytes)
    }

    pub fn basic_info(&self) -> Result<BasicInfo> {
        Ok(BasicInfo::decode(self.node_exact(NodeKind::BasicInfo, 16)?))
    }

    pub fn pc32(&self) -> Result<PcPair> {
        Ok(PcPair::decode32(self.node_exact(NodeKind::Pc32, 8)?))
    }

    pub fn pc64(&self) -> Result<PcPair> {
        Ok(PcPair::decode64(self.node_exact(NodeKind::Pc64, 16)?))
    }

    pub fn io(&self) -> Result<IoState> {
        Ok(IoState::decode(self.node_exact(NodeKind::Io, 8)?))
    }

    pub fn trap32(&self, index: i32) -> Result<TrapEvent> {
        let bytes = self.node(NodeKind::Trap32, index)?;
        if bytes.len() != 16 {
            return Err(Error::SizeMismatch {
                kind: NodeKind::Trap32,
                expected: 16,
                actual: bytes.len() as i64,
            });
        }
        Ok(TrapEvent::decode32(bytes))
    }

    pub fn trap64(&self, index: i32) -> Result<TrapEvent> {
        let bytes = self.node(NodeKind::Trap64, index)?;
        if bytes.len() != 24 {
            return Err(Error::SizeMismatch {
                kind: NodeKind::Trap64,
                expected: 24,
                actual: bytes.len() as i64,
            });
        }
        Ok(TrapEvent::decode64(bytes))
    }

    pub fn memory_access(&self, index: i32) -> Result<MemoryEvent> {
        let bytes = self.node(NodeKind::MemoryAccess, index)?;
        if bytes.len() != MemoryEvent::SIZE {
            return Err(Error::SizeMismatch {
                kind: NodeKind::MemoryAccess,
                expected: MemoryEvent::SIZE as i64,
                actual: bytes.len() as i64,
            });
        }
        Ok(MemoryEvent::decode(bytes))
    }

    pub fn int_reg32(&self) -> Result<[u32; 32]> {
        let bytes = self.node_exact(NodeKind::IntReg32, 128)?;
        let mut regs = [0u32; 32];
        for (i, r) in regs.iter_mut().enumerate() {
            *r = read_u32(bytes, i * 4);
        }
        Ok(regs)
    }

    pub fn int_reg64(&self) -> Result<[u64; 32]> {
        let bytes = self.node_exact(NodeKind::IntReg64, 256)?;
        let mut regs = [0u64; 32];
        for (i, r) in regs.iter_mut().enumerate() {
            *r = crate::byteio::read_u64(bytes, i * 8);
        }
        Ok(regs)
    }

    pub fn fp_reg(&self) -> Result<FpRegBytes<'a>> {
        Ok(FpRegBytes(self.node_exact(NodeKind::FpReg, 256)?))
    }

    pub fn csr32(&self) -> Result<Vec<(u32, u32)>> {
        let bytes = self.node(NodeKind::Csr32, 0)?;
        if bytes.is_empty() {
            return Err(Error::SizeMismatch {
                kind: NodeKind::Csr32,
                expected: 1,
                actual: 0,
            });
        }
        Ok(bytes
            .chunks_exact(8)
            .map(|c| (read_u32(c, 0), read_u32(c, 4)))
            .collect())
    }

    pub fn csr64(&self) -> Result<Vec<(u64, u64)>> {
        let bytes = self.node(NodeKind::Csr64, 0)?;
        if bytes.is_empty() {
            return Err(Error::SizeMismatch {
                kind: NodeKind::Csr64,
                expected: 1,
                actual: 0,
            });
        }
        Ok(bytes
            .chunks_exact(16)
            .map(|c| (crate::byteio::read_u64(c, 0), crate::byteio::read_u64(c, 8)))
            .collect())
    }

    pub fn memory(&self) -> Result<&'a [u8]> {
        self.node(NodeKind::Memory, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CycleBuilder;
    use crate::config::CycleConfig;

    #[test]
    fn round_trip_builder_view() {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        cfg.set_count(NodeKind::Pc64, 1);
        cfg.set_count(NodeKind::MemoryAccess, 2);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        b.set_basic_info(BasicInfo {
            cycle: 42,
            xlen: 64,
            pc: 0xdead_beef,
        })
        .unwrap();
        b.set_pc64(PcPair {
            virt: 0x1,
            phys: 0x2,
        })
        .unwrap();
        b.set_memory_access(
            0,
            MemoryEvent {
                access_type: crate::node::MemoryAccessType::Load,
                size: 4,
                value: 0xaa,
                vaddr: 0x100,
                paddr: 0x200,
            },
        )
        .unwrap();
        b.set_memory_access(
            1,
            MemoryEvent {
                access_type: crate::node::MemoryAccessType::Store,
                size: 8,
                value: 0xbb,
                vaddr: 0x300,
                paddr: 0x400,
            },
        )
        .unwrap();

        let bytes = b.into_bytes();
        let view = CycleView::new(&bytes).unwrap();
        assert_eq!(
            view.basic_info().unwrap(),
            BasicInfo {
                cycle: 42,
                xlen: 64,
                pc: 0xdead_beef
            }
        );
        assert_eq!(view.pc64().unwrap().virt, 1);
        assert_eq!(view.memory_access(0).unwrap().value, 0xaa);
        assert_eq!(view.memory_access(1).unwrap().value, 0xbb);
        assert!(matches!(
            view.node(NodeKind::Pc32, 0),
            Err(Error::NodeNotFound { .. })
        ));
        assert_eq!(view.cycle_size(), bytes.len() as i64);
    }

    #[test]
    fn too_small_is_corruption() {
        let tiny = [0u8; 4];
        assert!(matches!(
            CycleView::new(&tiny),
            Err(Error::Corruption { .. })
        ));
    }

    #[test]
    fn footer_mismatch_is_corruption() {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        let b = CycleBuilder::new(&cfg).unwrap();
        let mut bytes = b.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            CycleView::new(&bytes),
            Err(Error::Corruption { .. })
        ));
    }
}
