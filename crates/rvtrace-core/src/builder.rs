//! Cycle builder — container form.

use crate::config::CycleConfig;
use crate::error::{Error, Result};
use crate::node::{
    ALL_KINDS, BasicInfo, FpRegValue, IoState, MemoryEvent, NodeKind, PcPair, TrapEvent,
};

const HEADER_SIZE: i64 = 16;
const META_ENTRY_SIZE: i64 = 24;
const FOOTER_SIZE: i64 = 8;

#[derive(Clone, Copy, Debug)]
struct MetaSlot {
    kind: NodeKind,
    offset: i64,
    size: i64,
}

/// Owns a contiguous byte region sized exactly for `config`, with header,
/// meta table, and footer already written. Payload bytes start zeroed and
/// must be filled with `set_node`/the typed setters before publishing.
pub struct CycleBuilder {
    data: Vec<u8>,
    metas: Vec<MetaSlot>,
}

impl CycleBuilder {
    pub fn new(config: &CycleConfig) -> Result<Self> {
        if config.count(NodeKind::Pc32) > 0 && config.count(NodeKind::Pc64) > 0 {
            return Err(Error::MixedPc);
        }

        let total_count = i64::from(config.total_count());
        let mut metas = Vec::with_capacity(total_count as usize);
        let mut offset = HEADER_SIZE
            .checked_add(
                total_count
                    .checked_mul(META_ENTRY_SIZE)
                    .ok_or(Error::Overflow)?,
            )
            .ok_or(Error::Overflow)?;

        for kind in ALL_KINDS {
            for _ in 0..config.count(kind) {
                let size = kind.proper_size(config)?;
                metas.push(MetaSlot { kind, offset, size });
                offset = offset.checked_add(size).ok_or(Error::Overflow)?;
            }
        }
        let payload_end = offset;

        let region_size = payload_end
            .checked_add(FOOTER_SIZE)
            .ok_or(Error::Overflow)?;
        let footer_offset = region_size - FOOTER_SIZE;

        let mut data = vec![0u8; region_size as usize];
        crate::byteio::write_i64(&mut data, 0, footer_offset);
        crate::byteio::write_u32(&mut data, 8, config.total_count());
        crate::byteio::write_u32(&mut data, 12, 0);

        for (j, slot) in metas.iter().enumerate() {
            let base = (HEADER_SIZE + j as i64 * META_ENTRY_SIZE) as usize;
            crate::byteio::write_u32(&mut data, base, slot.kind.tag());
            crate::byteio::write_u32(&mut data, base + 4, 0);
            crate::byteio::write_i64(&mut data, base + 8, slot.offset);
            crate::byteio::write_i64(&mut data, base + 16, slot.size);
        }

        crate::byteio::write_i64(&mut data, footer_offset as usize, footer_offset);

        Ok(Self { data, metas })
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

    pub fn node_ptr(&mut self, kind: NodeKind, index: i32) -> Result<&mut [u8]> {
        let slot = *self.slot(kind, index)?;
        let start = slot.offset as usize;
        let end = start + slot.size as usize;
        Ok(&mut self.data[start..end])
    }

    pub fn set_node(&mut self, kind: NodeKind, index: i32, bytes: &[u8]) -> Result<()> {
        let slot = *self.slot(kind, index)?;
        if bytes.len() as i64 != slot.size {
            return Err(Error::SizeMismatch {
                kind,
                expected: slot.size,
                actual: bytes.len() as i64,
            });
        }
        let start = slot.offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn set_basic_info(&mut self, value: BasicInfo) -> Result<()> {
        let mut buf = [0u8; BasicInfo::SIZE];
        value.encode(&mut buf);
        self.set_node(NodeKind::BasicInfo, 0, &buf)
    }

    pub fn set_pc32(&mut self, value: PcPair) -> Result<()> {
        let mut buf = [0u8; 8];
        value.encode32(&mut buf);
        self.set_node(NodeKind::Pc32, 0, &buf)
    }

    pub fn set_pc64(&mut self, value: PcPair) -> Result<()> {
        let mut buf = [0u8; 16];
        value.encode64(&mut buf);
        self.set_node(NodeKind::Pc64, 0, &buf)
    }

    pub fn set_trap32(&mut self, index: i32, value: TrapEvent) -> Result<()> {
        let mut buf = [0u8; 16];
        value.encode32(&mut buf);
        self.set_node(NodeKind::Trap32, index, &buf)
    }

    pub fn set_trap64(&mut self, index: i32, value: TrapEvent) -> Result<()> {
        let mut buf = [0u8; 24];
        value.encode64(&mut buf);
        self.set_node(NodeKind::Trap64, index, &buf)
    }

    pub fn set_memory_access(&mut self, index: i32, value: MemoryEvent) -> Result<()> {
        let mut buf = [0u8; MemoryEvent::SIZE];
        value.encode(&mut buf);
        self.set_node(NodeKind::MemoryAccess, index, &buf)
    }

    pub fn set_io(&mut self, value: IoState) -> Result<()> {
        let mut buf = [0u8; IoState::SIZE];
        value.encode(&mut buf);
        self.set_node(NodeKind::Io, 0, &buf)
    }

    pub fn set_int_reg32(&mut self, regs: &[u32; 32]) -> Result<()> {
        let mut buf = [0u8; 128];
        for (i, r) in regs.iter().enumerate() {
            crate::byteio::write_u32(&mut buf, i * 4, *r);
        }
        self.set_node(NodeKind::IntReg32, 0, &buf)
    }

    pub fn set_int_reg64(&mut self, regs: &[u64; 32]) -> Result<()> {
        let mut buf = [0u8; 256];
        for (i, r) in regs.iter().enumerate() {
            crate::byteio::write_u64(&mut buf, i * 8, *r);
        }
        self.set_node(NodeKind::IntReg64, 0, &buf)
    }

    pub fn set_fp_reg(&mut self, regs: &[FpRegValue; 32]) -> Result<()> {
        let mut buf = [0u8; 256];
        for (i, r) in regs.iter().enumerate() {
            r.encode(&mut buf[i * 8..i * 8 + 8]);
        }
        self.set_node(NodeKind::FpReg, 0, &buf)
    }

    pub fn set_csr32(&mut self, entries: &[(u32, u32)]) -> Result<()> {
        let mut buf = vec![0u8; entries.len() * 8];
        for (i, (addr, value)) in entries.iter().enumerate() {
            crate::byteio::write_u32(&mut buf, i * 8, *addr);
            crate::byteio::write_u32(&mut buf, i * 8 + 4, *value);
        }
        self.set_node(NodeKind::Csr32, 0, &buf)
    }

    pub fn set_csr64(&mut self, entries: &[(u64, u64)]) -> Result<()> {
        let mut buf = vec![0u8; entries.len() * 16];
        for (i, (addr, value)) in entries.iter().enumerate() {
            crate::byteio::write_u64(&mut buf, i * 16, *addr);
            crate::byteio::write_u64(&mut buf, i * 16 + 8, *value);
        }
        self.set_node(NodeKind::Csr64, 0, &buf)
    }

    pub fn set_memory(&mut self, bytes: &[u8]) -> Result<()> {
        self.set_node(NodeKind::Memory, 0, bytes)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_size(&self) -> i64 {
        self.data.len() as i64
    }

    /// Consumes the builder, yielding the finished cycle bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_footer_size(n_meta: i64, payload: i64) -> i64 {
        HEADER_SIZE + n_meta * META_ENTRY_SIZE + payload + FOOTER_SIZE
    }

    #[test]
    fn builder_with_only_basic_info() {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        let b = CycleBuilder::new(&cfg).unwrap();
        assert_eq!(b.data_size(), header_footer_size(1, 16));
        assert_eq!(b.node_count(NodeKind::BasicInfo), 1);
        assert_eq!(b.node_count(NodeKind::Pc32), 0);
    }

    #[test]
    fn builder_with_basic_info_and_pc32() {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        cfg.set_count(NodeKind::Pc32, 1);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        b.set_basic_info(BasicInfo {
            cycle: 1,
            xlen: 32,
            pc: 0x1000,
        })
        .unwrap();
        b.set_pc32(PcPair {
            virt: 0x1000,
            phys: 0x2000,
        })
        .unwrap();
        assert_eq!(b.node_size(NodeKind::Pc32, 0).unwrap(), 8);
        assert!(matches!(
            b.node_size(NodeKind::Pc64, 0),
            Err(Error::NodeNotFound { .. })
        ));
    }

    #[test]
    fn mixed_pc_rejected() {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::Pc32, 1);
        cfg.set_count(NodeKind::Pc64, 1);
        assert!(matches!(CycleBuilder::new(&cfg), Err(Error::MixedPc)));
    }

    #[test]
    fn set_node_size_mismatch() {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        let err = b.set_node(NodeKind::BasicInfo, 0, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
    }

    #[test]
    fn meta_ordering_multi_kind() {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        cfg.set_count(NodeKind::MemoryAccess, 3);
        let b = CycleBuilder::new(&cfg).unwrap();
        assert_eq!(b.node_count(NodeKind::MemoryAccess), 3);
        for i in 0..3 {
            assert!(b.node_size(NodeKind::MemoryAccess, i).is_ok());
        }
        assert!(matches!(
            b.node_size(NodeKind::MemoryAccess, 3),
            Err(Error::NodeNotFound { .. })
        ));
    }

    #[test]
    fn footer_back_pointer() {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        let b = CycleBuilder::new(&cfg).unwrap();
        let footer_offset = b.data_size() - FOOTER_SIZE;
        let back_ptr = crate::byteio::read_i64(b.data(), footer_offset as usize);
        assert_eq!(back_ptr, footer_offset);
    }
}
