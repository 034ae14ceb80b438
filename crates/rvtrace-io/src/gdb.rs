//! GDB log dialect — a minimal reader for the whitespace-tokenized trace
//! some GDB-driven producers emit: `pc <hex> <discard>`, `priv <discard>`,
//! and one line per integer register, each cycle terminated by `BREAK`.
//!
//! Unlike the text trace format, this dialect is genuinely
//! token-oriented, not line-oriented: whitespace (including newlines) is
//! all equivalent, so this reader tokenizes the whole buffer up front
//! rather than splitting on lines. Only enough of a cycle survives to
//! extract a PC-only stream: no floating-point registers, I/O, or event
//! nodes exist in this dialect, and XLEN is always 64.

use std::fs;
use std::path::Path;

use tracing::warn;

use rvtrace_core::{Cycle, Error as CoreError, IoState, MemoryEvent, NodeKind, OpEvent, Result as CoreResult, TrapEvent};

use crate::error::{Error, Result};

/// Integer register names in `x0..x31` order, matching the original's
/// `g_IntRegNames` table.
pub const INT_REG_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

fn reg_index(name: &str) -> Option<usize> {
    INT_REG_NAMES.iter().position(|&n| n == name)
}

fn parse_hex(tok: &str) -> Result<u64> {
    u64::from_str_radix(tok, 16).map_err(|_| Error::ParseError {
        literal: tok.to_string(),
    })
}

/// One cycle parsed from a GDB log: a PC and, as they're seen, integer
/// register values. Registers not mentioned before the next `BREAK` keep
/// their previous (or zero-initialized) value, matching the original's
/// persistent register array.
#[derive(Clone, Debug)]
pub struct GdbCycle {
    cycle_index: u32,
    pc: Option<u64>,
    int_regs: [u64; 32],
}

impl Cycle for GdbCycle {
    fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    /// Always 64: the dialect carries no XLEN marker of its own.
    fn xlen(&self) -> u32 {
        64
    }

    /// The dialect has no separate virtual/physical PC; both reads
    /// return the same value, as in the logger form.
    fn pc(&self, _physical: bool) -> CoreResult<u64> {
        self.pc.ok_or(CoreError::NodeNotFound {
            kind: NodeKind::Pc64,
            index: 0,
        })
    }

    fn has_int_reg(&self) -> bool {
        true
    }

    fn has_fp_reg(&self) -> bool {
        false
    }

    fn has_io(&self) -> bool {
        false
    }

    fn op_event_count(&self) -> usize {
        0
    }

    fn memory_event_count(&self) -> usize {
        0
    }

    fn trap_event_count(&self) -> usize {
        0
    }

    fn int_reg(&self, i: usize) -> CoreResult<u64> {
        self.int_regs
            .get(i)
            .copied()
            .ok_or(CoreError::IndexOutOfRange { i: i as i32, n: 32 })
    }

    fn fp_reg(&self, _i: usize) -> CoreResult<u64> {
        Err(CoreError::NotImplemented {
            feature: "floating-point registers in the GDB log dialect".into(),
        })
    }

    fn copy_io(&self) -> CoreResult<IoState> {
        Err(CoreError::NodeNotFound {
            kind: NodeKind::Io,
            index: 0,
        })
    }

    fn copy_op_event(&self, _i: usize) -> CoreResult<OpEvent> {
        Err(CoreError::IndexOutOfRange { i: 0, n: 0 })
    }

    fn copy_memory_event(&self, _i: usize) -> CoreResult<MemoryEvent> {
        Err(CoreError::IndexOutOfRange { i: 0, n: 0 })
    }

    fn copy_trap_event(&self, _i: usize) -> CoreResult<TrapEvent> {
        Err(CoreError::IndexOutOfRange { i: 0, n: 0 })
    }
}

/// Forward-only reader over a GDB log. Tokenizes the whole input up
/// front (whitespace-delimited, newline-insensitive) and walks it one
/// cycle at a time.
pub struct GdbTraceReader {
    tokens: Vec<String>,
    pos: usize,
    cycle_counter: u32,
    current: Option<GdbCycle>,
}

impl GdbTraceReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::FileOpenFailure {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let tokens = text.split_whitespace().map(str::to_string).collect();
        let mut reader = Self {
            tokens,
            pos: 0,
            cycle_counter: 0,
            current: None,
        };
        reader.advance()?;
        Ok(reader)
    }

    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    pub fn current_cycle(&self) -> Option<&GdbCycle> {
        self.current.as_ref()
    }

    pub fn next(&mut self) -> Result<()> {
        self.advance()
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn take(&mut self) -> Result<String> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| Error::from(CoreError::Corruption {
                at_offset: Some(self.pos as i64),
                reason: "GDB log ended mid-record".into(),
            }))?;
        self.pos += 1;
        Ok(tok)
    }

    fn advance(&mut self) -> Result<()> {
        if self.peek().is_none() {
            self.current = None;
            return Ok(());
        }

        let mut pc = None;
        let mut int_regs = self
            .current
            .as_ref()
            .map(|c| c.int_regs)
            .unwrap_or([0u64; 32]);

        loop {
            let Some(head) = self.peek().map(str::to_string) else {
                return Err(CoreError::Corruption {
                    at_offset: Some(self.pos as i64),
                    reason: "GDB log cycle not terminated by BREAK".into(),
                }
                .into());
            };

            if head == "BREAK" {
                self.pos += 1;
                break;
            }

            if head == "pc" {
                self.pos += 1;
                let value = parse_hex(&self.take()?)?;
                self.take()?;
                pc = Some(value);
                continue;
            }

            if head == "priv" {
                self.pos += 1;
                self.take()?;
                continue;
            }

            if let Some(idx) = reg_index(&head) {
                self.pos += 1;
                let value = parse_hex(&self.take()?)?;
                self.take()?;
                int_regs[idx] = value;
                continue;
            }

            warn!(literal = %head, "unrecognized token in GDB log; stopping trace early");
            self.current = None;
            self.pos = self.tokens.len();
            return Ok(());
        }

        self.current = Some(GdbCycle {
            cycle_index: self.cycle_counter,
            pc,
            int_regs,
        });
        self.cycle_counter += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "pc 80000000 0\nra 0 0\nsp 1000 0\nBREAK\npc 80000004 0\nBREAK\n";

    #[test]
    fn parses_two_cycles_and_tracks_pc() {
        let mut reader = GdbTraceReader::parse(SAMPLE).unwrap();
        assert!(!reader.is_end());
        let first = reader.current_cycle().unwrap();
        assert_eq!(first.xlen(), 64);
        assert_eq!(first.pc(false).unwrap(), 0x8000_0000);
        assert_eq!(first.int_reg(reg_index("sp").unwrap()).unwrap(), 0x1000);

        reader.next().unwrap();
        let second = reader.current_cycle().unwrap();
        assert_eq!(second.pc(false).unwrap(), 0x8000_0004);

        reader.next().unwrap();
        assert!(reader.is_end());
    }

    #[test]
    fn registers_persist_across_cycles() {
        let log = "ra 5 0\nBREAK\npc 0 0\nBREAK\n";
        let mut reader = GdbTraceReader::parse(log).unwrap();
        reader.next().unwrap();
        let second = reader.current_cycle().unwrap();
        assert_eq!(second.int_reg(reg_index("ra").unwrap()).unwrap(), 5);
    }

    #[test]
    fn unrecognized_token_ends_trace() {
        let log = "pc 1 0\nbanana\nBREAK\n";
        let reader = GdbTraceReader::parse(log).unwrap();
        assert!(reader.is_end());
    }

    #[test]
    fn missing_break_is_corruption() {
        let log = "pc 1 0\n";
        assert!(GdbTraceReader::parse(log).is_err());
    }

    #[test]
    fn priv_token_is_discarded() {
        let log = "priv 3 0\npc 2 0\nBREAK\n";
        let reader = GdbTraceReader::parse(log).unwrap();
        assert_eq!(reader.current_cycle().unwrap().pc(true).unwrap(), 2);
    }
}
