//! Text trace reader/writer — a line-oriented, human-readable trace
//! format with one `XLEN` header for the whole trace and a sequence of
//! record lines per cycle, terminated by `BREAK`.
//!
//! An unrecognized leading token aborts the current cycle rather than
//! the whole parse, matching the tolerance a GDB log dialect needs. The
//! register blocks (`INT`/`FP`) are two lines of 16 hex values each.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use tracing::warn;

use rvtrace_core::{
    Cycle, Error as CoreError, IoState, MemoryAccessType, MemoryEvent, NodeKind, OpEvent, PcPair,
    PrivilegeLevel, Result as CoreResult, TrapEvent, TrapType,
};

use crate::error::{Error, Result};

const REG_LINES: usize = 2;
const REGS_PER_LINE: usize = 16;

fn parse_hex_u64(tok: &str) -> Result<u64> {
    u64::from_str_radix(tok, 16).map_err(|_| Error::ParseError {
        literal: tok.to_string(),
    })
}

fn parse_hex_u32(tok: &str) -> Result<u32> {
    u32::from_str_radix(tok, 16).map_err(|_| Error::ParseError {
        literal: tok.to_string(),
    })
}

fn priv_literal(p: PrivilegeLevel) -> &'static str {
    match p {
        PrivilegeLevel::User => "U",
        PrivilegeLevel::Supervisor => "S",
        PrivilegeLevel::Reserved => "RSV",
        PrivilegeLevel::Machine => "M",
    }
}

fn parse_priv(tok: &str) -> Result<PrivilegeLevel> {
    Ok(match tok {
        "U" => PrivilegeLevel::User,
        "S" => PrivilegeLevel::Supervisor,
        "RSV" => PrivilegeLevel::Reserved,
        "M" => PrivilegeLevel::Machine,
        _ => {
            return Err(Error::ParseError {
                literal: tok.to_string(),
            });
        }
    })
}

fn access_literal(a: MemoryAccessType) -> &'static str {
    match a {
        MemoryAccessType::Instruction => "INSN",
        MemoryAccessType::Load => "LOAD",
        MemoryAccessType::Store => "STORE",
    }
}

fn parse_access(tok: &str) -> Result<MemoryAccessType> {
    Ok(match tok {
        "INSN" => MemoryAccessType::Instruction,
        "LOAD" => MemoryAccessType::Load,
        "STORE" => MemoryAccessType::Store,
        _ => {
            return Err(Error::ParseError {
                literal: tok.to_string(),
            });
        }
    })
}

fn trap_type_literal(t: TrapType) -> &'static str {
    match t {
        TrapType::Interrupt => "INT",
        TrapType::Exception => "EXC",
    }
}

fn parse_trap_type(tok: &str) -> Result<TrapType> {
    Ok(match tok {
        "INT" => TrapType::Interrupt,
        "EXC" => TrapType::Exception,
        _ => {
            return Err(Error::ParseError {
                literal: tok.to_string(),
            });
        }
    })
}

/// One cycle parsed from a text trace. An owned variant of the unified
/// cycle interface — unlike the container/logger forms, it doesn't
/// borrow from a shared buffer.
#[derive(Clone, Debug, Default)]
pub struct TextCycle {
    cycle_index: u32,
    xlen: u32,
    note: Option<String>,
    pc: Option<PcPair>,
    int_regs: Option<[u64; 32]>,
    fp_regs: Option<[u64; 32]>,
    io: Option<IoState>,
    op_events: Vec<OpEvent>,
    memory_events: Vec<MemoryEvent>,
    trap_events: Vec<TrapEvent>,
}

impl TextCycle {
    /// Free-text `NOTE` record, if the cycle carried one. Not part of the
    /// unified [`Cycle`] trait — it's a text-format-only annotation.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

impl Cycle for TextCycle {
    fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    fn xlen(&self) -> u32 {
        self.xlen
    }

    fn pc(&self, physical: bool) -> CoreResult<u64> {
        let pair = self.pc.ok_or(CoreError::NodeNotFound {
            kind: NodeKind::Pc64,
            index: 0,
        })?;
        Ok(if physical { pair.phys } else { pair.virt })
    }

    fn has_int_reg(&self) -> bool {
        self.int_regs.is_some()
    }

    fn has_fp_reg(&self) -> bool {
        self.fp_regs.is_some()
    }

    fn has_io(&self) -> bool {
        self.io.is_some()
    }

    fn op_event_count(&self) -> usize {
        self.op_events.len()
    }

    fn memory_event_count(&self) -> usize {
        self.memory_events.len()
    }

    fn trap_event_count(&self) -> usize {
        self.trap_events.len()
    }

    fn int_reg(&self, i: usize) -> CoreResult<u64> {
        let regs = self.int_regs.ok_or(CoreError::NodeNotFound {
            kind: NodeKind::IntReg64,
            index: 0,
        })?;
        regs.get(i)
            .copied()
            .ok_or(CoreError::IndexOutOfRange { i: i as i32, n: 32 })
    }

    fn fp_reg(&self, i: usize) -> CoreResult<u64> {
        let regs = self.fp_regs.ok_or(CoreError::NodeNotFound {
            kind: NodeKind::FpReg,
            index: 0,
        })?;
        regs.get(i)
            .copied()
            .ok_or(CoreError::IndexOutOfRange { i: i as i32, n: 32 })
    }

    fn copy_io(&self) -> CoreResult<IoState> {
        self.io.ok_or(CoreError::NodeNotFound {
            kind: NodeKind::Io,
            index: 0,
        })
    }

    fn copy_op_event(&self, i: usize) -> CoreResult<OpEvent> {
        self.op_events.get(i).copied().ok_or(CoreError::IndexOutOfRange {
            i: i as i32,
            n: self.op_events.len() as i32,
        })
    }

    fn copy_memory_event(&self, i: usize) -> CoreResult<MemoryEvent> {
        self.memory_events
            .get(i)
            .copied()
            .ok_or(CoreError::IndexOutOfRange {
                i: i as i32,
                n: self.memory_events.len() as i32,
            })
    }

    fn copy_trap_event(&self, i: usize) -> CoreResult<TrapEvent> {
        self.trap_events
            .get(i)
            .copied()
            .ok_or(CoreError::IndexOutOfRange {
                i: i as i32,
                n: self.trap_events.len() as i32,
            })
    }
}

/// Forward-only reader over a line-oriented text trace.
pub struct TextTraceReader {
    lines: Vec<String>,
    xlen: u32,
    pos: usize,
    cycle_counter: u32,
    current: Option<TextCycle>,
}

impl TextTraceReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::FileOpenFailure {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses an in-memory text trace (used directly by tests and by
    /// callers that already hold the text, e.g. piped input).
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        if lines.is_empty() {
            return Err(CoreError::Corruption {
                at_offset: Some(0),
                reason: "empty text trace".into(),
            }
            .into());
        }

        let header = &lines[0];
        let mut tokens = header.split_whitespace();
        if tokens.next() != Some("XLEN") {
            return Err(Error::ParseError {
                literal: header.clone(),
            });
        }
        let xlen = match tokens.next() {
            Some("32") => 32,
            Some("64") => 64,
            other => {
                return Err(Error::ParseError {
                    literal: other.unwrap_or_default().to_string(),
                });
            }
        };

        let mut reader = Self {
            lines,
            xlen,
            pos: 1,
            cycle_counter: 0,
            current: None,
        };
        reader.advance()?;
        Ok(reader)
    }

    pub fn xlen(&self) -> u32 {
        self.xlen
    }

    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    pub fn current_cycle(&self) -> Option<&TextCycle> {
        self.current.as_ref()
    }

    pub fn next(&mut self) -> Result<()> {
        self.advance()
    }

    fn advance(&mut self) -> Result<()> {
        if self.pos >= self.lines.len() {
            self.current = None;
            return Ok(());
        }
        match self.parse_one_cycle() {
            Ok(cycle) => {
                self.current = Some(cycle);
                Ok(())
            }
            Err(Error::ParseError { literal }) => {
                warn!(literal, "unrecognized literal in text trace; stopping cycle early");
                self.current = None;
                self.pos = self.lines.len();
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    fn parse_reg_block(&mut self) -> Result<[u64; 32]> {
        let mut regs = [0u64; 32];
        let mut idx = 0;
        for _ in 0..REG_LINES {
            if self.pos >= self.lines.len() {
                return Err(CoreError::Corruption {
                    at_offset: Some(self.pos as i64),
                    reason: "truncated register block".into(),
                }
                .into());
            }
            let line = self.lines[self.pos].clone();
            self.pos += 1;
            for tok in line.split_whitespace().take(REGS_PER_LINE) {
                if idx >= 32 {
                    break;
                }
                regs[idx] = parse_hex_u64(tok)?;
                idx += 1;
            }
        }
        Ok(regs)
    }

    fn parse_one_cycle(&mut self) -> Result<TextCycle> {
        let mut cycle = TextCycle {
            cycle_index: self.cycle_counter,
            xlen: self.xlen,
            ..Default::default()
        };

        loop {
            if self.pos >= self.lines.len() {
                return Err(CoreError::Corruption {
                    at_offset: Some(self.pos as i64),
                    reason: "cycle not terminated by BREAK".into(),
                }
                .into());
            }
            let line = self.lines[self.pos].clone();
            self.pos += 1;
            let mut tokens = line.split_whitespace();
            let Some(tag) = tokens.next() else {
                continue;
            };

            match tag {
                "BREAK" => break,
                "NOTE" => {
                    cycle.note = Some(tokens.collect::<Vec<_>>().join(" "));
                }
                "PC" => {
                    let virt = parse_hex_u64(tokens.next().ok_or_else(|| Error::ParseError {
                        literal: line.clone(),
                    })?)?;
                    let phys = parse_hex_u64(tokens.next().ok_or_else(|| Error::ParseError {
                        literal: line.clone(),
                    })?)?;
                    cycle.pc = Some(PcPair { virt, phys });
                }
                "INT" => {
                    cycle.int_regs = Some(self.parse_reg_block()?);
                }
                "FP" => {
                    cycle.fp_regs = Some(self.parse_reg_block()?);
                }
                "IO" => {
                    let host_io = parse_hex_u32(tokens.next().ok_or_else(|| Error::ParseError {
                        literal: line.clone(),
                    })?)?;
                    cycle.io = Some(IoState { host_io });
                }
                "OP" => {
                    let insn = parse_hex_u32(tokens.next().ok_or_else(|| Error::ParseError {
                        literal: line.clone(),
                    })?)?;
                    let priv_level = parse_priv(tokens.next().ok_or_else(|| Error::ParseError {
                        literal: line.clone(),
                    })?)?;
                    cycle.op_events.push(OpEvent { insn, priv_level });
                }
                "MA" => {
                    let missing = || Error::ParseError {
                        literal: line.clone(),
                    };
                    let access_type = parse_access(tokens.next().ok_or_else(missing)?)?;
                    let size = parse_hex_u32(tokens.next().ok_or_else(missing)?)?;
                    let value = parse_hex_u64(tokens.next().ok_or_else(missing)?)?;
                    let vaddr = parse_hex_u64(tokens.next().ok_or_else(missing)?)?;
                    let paddr = parse_hex_u64(tokens.next().ok_or_else(missing)?)?;
                    cycle.memory_events.push(MemoryEvent {
                        access_type,
                        size,
                        value,
                        vaddr,
                        paddr,
                    });
                }
                "TRAP" => {
                    let missing = || Error::ParseError {
                        literal: line.clone(),
                    };
                    let trap_type = parse_trap_type(tokens.next().ok_or_else(missing)?)?;
                    let from = parse_priv(tokens.next().ok_or_else(missing)?)?;
                    let to = parse_priv(tokens.next().ok_or_else(missing)?)?;
                    let cause = parse_hex_u32(tokens.next().ok_or_else(missing)?)?;
                    let value = parse_hex_u64(tokens.next().ok_or_else(missing)?)?;
                    cycle.trap_events.push(TrapEvent {
                        trap_type,
                        from,
                        to,
                        cause,
                        value,
                    });
                }
                other => {
                    return Err(Error::ParseError {
                        literal: other.to_string(),
                    });
                }
            }
        }

        self.cycle_counter += 1;
        Ok(cycle)
    }
}

/// Writes a text trace: one `XLEN` header line, then one record block per
/// cycle in grammar order (NOTE, PC, INT, FP, IO, OP, MA, TRAP, BREAK),
/// emitting only the records the cycle actually has.
pub struct TextTraceWriter<W: std::io::Write> {
    out: W,
    xlen: u32,
    header_written: bool,
}

impl<W: std::io::Write> TextTraceWriter<W> {
    pub fn new(out: W, xlen: u32) -> Self {
        Self {
            out,
            xlen,
            header_written: false,
        }
    }

    pub fn print_cycle(&mut self, cycle: &dyn Cycle, note: Option<&str>) -> Result<()> {
        if !self.header_written {
            writeln!(self.out, "XLEN {}", self.xlen)?;
            self.header_written = true;
        }

        if let Some(note) = note {
            writeln!(self.out, "NOTE {note}")?;
        }

        if let Ok(virt) = cycle.pc(false) {
            let phys = cycle.pc(true).unwrap_or(virt);
            writeln!(self.out, "PC {virt:x} {phys:x}")?;
        }

        if cycle.has_int_reg() {
            writeln!(self.out, "INT")?;
            self.write_reg_block(|i| cycle.int_reg(i).unwrap_or(0))?;
        }

        if cycle.has_fp_reg() {
            writeln!(self.out, "FP")?;
            self.write_reg_block(|i| cycle.fp_reg(i).unwrap_or(0))?;
        }

        if cycle.has_io() {
            let io = cycle.copy_io()?;
            writeln!(self.out, "IO {:x}", io.host_io)?;
        }

        for i in 0..cycle.op_event_count() {
            let e = cycle.copy_op_event(i)?;
            writeln!(self.out, "OP {:x} {}", e.insn, priv_literal(e.priv_level))?;
        }

        for i in 0..cycle.memory_event_count() {
            let e = cycle.copy_memory_event(i)?;
            writeln!(
                self.out,
                "MA {} {:x} {:x} {:x} {:x}",
                access_literal(e.access_type),
                e.size,
                e.value,
                e.vaddr,
                e.paddr
            )?;
        }

        for i in 0..cycle.trap_event_count() {
            let e = cycle.copy_trap_event(i)?;
            writeln!(
                self.out,
                "TRAP {} {} {} {:x} {:x}",
                trap_type_literal(e.trap_type),
                priv_literal(e.from),
                priv_literal(e.to),
                e.cause,
                e.value
            )?;
        }

        writeln!(self.out, "BREAK")?;
        Ok(())
    }

    fn write_reg_block(&mut self, get: impl Fn(usize) -> u64) -> Result<()> {
        for line in 0..REG_LINES {
            write!(self.out, " ")?;
            for col in 0..REGS_PER_LINE {
                let i = line * REGS_PER_LINE + col;
                if col > 0 {
                    write!(self.out, " ")?;
                }
                write!(self.out, "{:x}", get(i))?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }
}

impl TextTraceWriter<fs::File> {
    pub fn create(path: impl AsRef<Path>, xlen: u32) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::File::create(path).map_err(|source| Error::FileOpenFailure {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(file, xlen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "XLEN 32\nPC 80000000 1000\nINT\n 0 1 2 3 4 5 6 7 8 9 a b c d e f\n 10 11 12 13 14 15 16 17 18 19 1a 1b 1c 1d 1e 1f\nBREAK\nPC 80000004 1004\nBREAK\n";

    #[test]
    fn parses_two_cycles() {
        let mut reader = TextTraceReader::parse(SAMPLE).unwrap();
        assert_eq!(reader.xlen(), 32);

        let first = reader.current_cycle().unwrap();
        assert_eq!(first.pc(false).unwrap(), 0x8000_0000);
        assert_eq!(first.pc(true).unwrap(), 0x1000);
        assert!(first.has_int_reg());
        for i in 0..32u64 {
            assert_eq!(first.int_reg(i as usize).unwrap(), i);
        }

        reader.next().unwrap();
        let second = reader.current_cycle().unwrap();
        assert_eq!(second.pc(false).unwrap(), 0x8000_0004);
        assert!(!second.has_int_reg());

        reader.next().unwrap();
        assert!(reader.is_end());
    }

    #[test]
    fn unknown_literal_stops_at_end() {
        let bad = "XLEN 32\nPC 80000000 1000\nWAT 1 2 3\nBREAK\n";
        let reader = TextTraceReader::parse(bad).unwrap();
        assert!(reader.is_end());
    }

    #[test]
    fn print_then_parse_round_trips_pc_and_int() {
        let mut reader = TextTraceReader::parse(SAMPLE).unwrap();
        let cycle = reader.current_cycle().unwrap().clone();

        let mut buf = Vec::new();
        {
            let mut writer = TextTraceWriter::new(&mut buf, 32);
            writer.print_cycle(&cycle, None).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();

        let mut reparsed = TextTraceReader::parse(&text).unwrap();
        let round_tripped = reparsed.current_cycle().unwrap();
        assert_eq!(round_tripped.pc(false).unwrap(), cycle.pc(false).unwrap());
        assert_eq!(round_tripped.pc(true).unwrap(), cycle.pc(true).unwrap());
        for i in 0..32 {
            assert_eq!(round_tripped.int_reg(i).unwrap(), cycle.int_reg(i).unwrap());
        }
    }

    #[test]
    fn note_record_round_trips() {
        let mut buf = Vec::new();
        let mut cycle = TextCycle {
            cycle_index: 0,
            xlen: 64,
            ..Default::default()
        };
        cycle.pc = Some(PcPair { virt: 1, phys: 2 });
        {
            let mut writer = TextTraceWriter::new(&mut buf, 64);
            writer.print_cycle(&cycle, Some("hello world")).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("NOTE hello world"));
        let mut reader = TextTraceReader::parse(&text).unwrap();
        assert_eq!(reader.current_cycle().unwrap().note(), Some("hello world"));
    }
}
