//! Cycle filter — a boolean predicate on a cycle, plus a mini-parser for
//! the short textual DSL used by the `dump` CLI's `--filter` flag.
//!
//! Grounded on `CycleFilter.cpp`: same three predicates (always-true, PC,
//! memory-access), same `<tag>:<hex>` DSL and tag set. The original exits
//! the process on an unknown tag; here that becomes `Error::UnknownFilter`
//! so the CLI layer decides how to report it.

use rvtrace_core::{Cycle, MemoryAccessType};

use crate::error::{Error, Result};

/// A boolean predicate over a cycle.
pub trait Filter {
    fn apply(&self, cycle: &dyn Cycle) -> bool;
}

/// Matches every cycle. The filter used when no `--filter` is given.
pub struct DefaultFilter;

impl Filter for DefaultFilter {
    fn apply(&self, _cycle: &dyn Cycle) -> bool {
        true
    }
}

/// True iff the cycle's PC (virtual or physical, per `physical`) equals
/// `address`.
pub struct PcFilter {
    pub address: u64,
    pub physical: bool,
}

impl Filter for PcFilter {
    fn apply(&self, cycle: &dyn Cycle) -> bool {
        cycle.pc(self.physical).map(|pc| pc == self.address).unwrap_or(false)
    }
}

/// True iff some memory event's `[addr, addr+size)` range contains
/// `address` and its access kind satisfies the load/store mask.
/// Instruction fetches count as loads, matching the original.
pub struct MemoryAccessFilter {
    pub address: u64,
    pub physical: bool,
    pub match_load: bool,
    pub match_store: bool,
}

impl Filter for MemoryAccessFilter {
    fn apply(&self, cycle: &dyn Cycle) -> bool {
        for i in 0..cycle.memory_event_count() {
            let Ok(event) = cycle.copy_memory_event(i) else {
                continue;
            };
            if !event.contains(self.address, self.physical) {
                continue;
            }
            let matches = match event.access_type {
                MemoryAccessType::Instruction | MemoryAccessType::Load => self.match_load,
                MemoryAccessType::Store => self.match_store,
            };
            if matches {
                return true;
            }
        }
        false
    }
}

/// Parses a filter description of the form `<tag>:<hex-value>`. An empty
/// description yields [`DefaultFilter`].
pub fn parse_filter(description: &str) -> Result<Box<dyn Filter>> {
    if description.is_empty() {
        return Ok(Box::new(DefaultFilter));
    }

    let (tag, hex) = description.split_once(':').ok_or_else(|| Error::MalformedFilter {
        description: description.to_string(),
    })?;
    let address = u64::from_str_radix(hex.trim(), 16).map_err(|_| Error::MalformedFilter {
        description: description.to_string(),
    })?;

    let filter: Box<dyn Filter> = match tag {
        "P" => Box::new(PcFilter { address, physical: false }),
        "PP" => Box::new(PcFilter { address, physical: true }),
        "A" => Box::new(MemoryAccessFilter {
            address,
            physical: false,
            match_load: true,
            match_store: true,
        }),
        "AP" => Box::new(MemoryAccessFilter {
            address,
            physical: true,
            match_load: true,
            match_store: true,
        }),
        "L" => Box::new(MemoryAccessFilter {
            address,
            physical: false,
            match_load: true,
            match_store: false,
        }),
        "LP" => Box::new(MemoryAccessFilter {
            address,
            physical: true,
            match_load: true,
            match_store: false,
        }),
        "S" => Box::new(MemoryAccessFilter {
            address,
            physical: false,
            match_load: false,
            match_store: true,
        }),
        "SP" => Box::new(MemoryAccessFilter {
            address,
            physical: true,
            match_load: false,
            match_store: true,
        }),
        other => {
            return Err(Error::UnknownFilter { tag: other.to_string() });
        }
    };
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvtrace_core::{
        BasicInfo, ContainerCycle, CycleBuilder, CycleConfig, CycleView, MemoryEvent, NodeKind,
        PcPair,
    };

    fn cycle_with_pc(virt: u64, phys: u64) -> Vec<u8> {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        cfg.set_count(NodeKind::Pc64, 1);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        b.set_basic_info(BasicInfo { cycle: 0, xlen: 64, pc: virt }).unwrap();
        b.set_pc64(PcPair { virt, phys }).unwrap();
        b.into_bytes()
    }

    #[test]
    fn default_filter_always_matches() {
        let bytes = cycle_with_pc(1, 2);
        let view = CycleView::new(&bytes).unwrap();
        let cycle = ContainerCycle::new(view);
        assert!(DefaultFilter.apply(&cycle));
    }

    #[test]
    fn pc_filter_matches_virtual_and_physical() {
        let bytes = cycle_with_pc(0x1000, 0x9000);
        let view = CycleView::new(&bytes).unwrap();
        let cycle = ContainerCycle::new(view);

        assert!(PcFilter { address: 0x1000, physical: false }.apply(&cycle));
        assert!(!PcFilter { address: 0x1000, physical: true }.apply(&cycle));
        assert!(PcFilter { address: 0x9000, physical: true }.apply(&cycle));
    }

    #[test]
    fn parse_filter_rejects_unknown_tag() {
        let err = parse_filter("Q:10").unwrap_err();
        assert!(matches!(err, Error::UnknownFilter { .. }));
    }

    #[test]
    fn parse_filter_builds_memory_access_filter() {
        let filter = parse_filter("L:1000").unwrap();
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        cfg.set_count(NodeKind::MemoryAccess, 1);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        b.set_basic_info(BasicInfo { cycle: 0, xlen: 64, pc: 0 }).unwrap();
        b.set_memory_access(
            0,
            MemoryEvent {
                access_type: MemoryAccessType::Load,
                size: 4,
                value: 0,
                vaddr: 0x1000,
                paddr: 0x2000,
            },
        )
        .unwrap();
        let bytes = b.into_bytes();
        let view = CycleView::new(&bytes).unwrap();
        let cycle = ContainerCycle::new(view);
        assert!(filter.apply(&cycle));
    }
}
