//! Picks a trace reader by the path's extension and offers a single
//! forward-walk helper that behaves the same regardless of which
//! concrete reader backs it.
//!
//! Dispatch table per spec §6: `.tbin`/`.bin` -> binary (container or
//! logger, auto-sniffed), `.tidx`/`.idx` -> sharded index, `.gdb.log` ->
//! the GDB log dialect, anything else -> the line-oriented text format.

use std::path::Path;

use rvtrace_core::Cycle;
use rvtrace_io::{GdbTraceReader, IndexTraceReader, TextTraceReader, TraceFileReader};

use crate::error::CliResult;

pub enum TraceSource {
    Binary(TraceFileReader),
    Index(IndexTraceReader),
    Text(TextTraceReader),
    Gdb(GdbTraceReader),
}

impl TraceSource {
    pub fn open(path: &Path) -> CliResult<Self> {
        let name = path.to_string_lossy();
        if name.ends_with(".gdb.log") {
            return Ok(Self::Gdb(GdbTraceReader::open(path)?));
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("tbin" | "bin") => Ok(Self::Binary(TraceFileReader::open_sniffed(path)?)),
            Some("tidx" | "idx") => Ok(Self::Index(IndexTraceReader::open(path)?)),
            _ => Ok(Self::Text(TextTraceReader::open(path)?)),
        }
    }

    /// XLEN to head a text/JSON dump with, inferred from whichever cycle
    /// is current. The GDB dialect carries no XLEN marker and always
    /// reports 64.
    pub fn xlen(&self) -> u32 {
        match self {
            Self::Binary(r) => r
                .current_cycle()
                .and_then(Result::ok)
                .map(|c| c.xlen())
                .unwrap_or(64),
            Self::Index(r) => r
                .current_cycle()
                .and_then(Result::ok)
                .map(|c| c.xlen())
                .unwrap_or(64),
            Self::Text(r) => r.xlen(),
            Self::Gdb(_) => 64,
        }
    }

    /// Visits cycles forward from the current position in cycle-index
    /// order, calling `visit(index, cycle)` for each. Stops when the
    /// source is exhausted or `visit` returns `Ok(false)`.
    pub fn walk(&mut self, mut visit: impl FnMut(u32, &dyn Cycle) -> CliResult<bool>) -> CliResult<()> {
        let mut index = 0u32;
        loop {
            let keep_going = match self {
                Self::Binary(r) => {
                    if r.is_end() {
                        break;
                    }
                    let cycle = r.current_cycle().expect("checked is_end above")?;
                    let keep = visit(index, &cycle)?;
                    r.next()?;
                    keep
                }
                Self::Index(r) => {
                    if r.is_end() {
                        break;
                    }
                    let cycle = r.current_cycle().expect("checked is_end above")?;
                    let keep = visit(index, &cycle)?;
                    r.next()?;
                    keep
                }
                Self::Text(r) => {
                    let Some(cycle) = r.current_cycle() else {
                        break;
                    };
                    let keep = visit(index, cycle)?;
                    r.next()?;
                    keep
                }
                Self::Gdb(r) => {
                    let Some(cycle) = r.current_cycle() else {
                        break;
                    };
                    let keep = visit(index, cycle)?;
                    r.next()?;
                    keep
                }
            };
            index += 1;
            if !keep_going {
                break;
            }
        }
        Ok(())
    }
}
