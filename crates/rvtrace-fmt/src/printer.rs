//! Cycle printers — text, JSON, and PC-only renderers, per spec §4.13.
//!
//! The text variant emits the same grammar as `rvtrace_io::TextCycle`'s
//! writer (so its output round-trips through that reader); disassembly
//! is appended as a trailing comment on the `OP` line, which the text
//! reader's tokenizer already ignores past the fields it consumes. The
//! JSON variant is real JSON (`serde_json`) rather than the original
//! printer's curly-brace pseudo-JSON with inline comments — the key
//! names here are the ones spec.md pins down.

use std::io::Write;

use serde_json::json;

use rvtrace_core::Cycle;

use crate::disasm::Disassembler;
use crate::error::Result;

const REG_LINES: usize = 2;
const REGS_PER_LINE: usize = 16;

fn priv_literal(p: rvtrace_core::PrivilegeLevel) -> &'static str {
    use rvtrace_core::PrivilegeLevel::*;
    match p {
        User => "U",
        Supervisor => "S",
        Reserved => "RSV",
        Machine => "M",
    }
}

fn access_literal(a: rvtrace_core::MemoryAccessType) -> &'static str {
    use rvtrace_core::MemoryAccessType::*;
    match a {
        Instruction => "INSN",
        Load => "LOAD",
        Store => "STORE",
    }
}

fn trap_type_literal(t: rvtrace_core::TrapType) -> &'static str {
    use rvtrace_core::TrapType::*;
    match t {
        Interrupt => "INT",
        Exception => "EXC",
    }
}

/// Renders a cycle as a line-oriented text block, with an optional
/// disassembler to annotate `OP` lines.
pub struct TextCyclePrinter<W: Write, D: Disassembler> {
    out: W,
    xlen: u32,
    disassembler: Option<D>,
    header_written: bool,
}

impl<W: Write, D: Disassembler> TextCyclePrinter<W, D> {
    pub fn new(out: W, xlen: u32, disassembler: Option<D>) -> Self {
        Self {
            out,
            xlen,
            disassembler,
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

        let virt_pc = cycle.pc(false).ok();
        if let Some(virt) = virt_pc {
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
            write!(self.out, "OP {:x} {}", e.insn, priv_literal(e.priv_level))?;
            if let Some(d) = &self.disassembler {
                let decoded = d.disassemble(e.insn, virt_pc.unwrap_or(0));
                write!(self.out, " ; {} {}", decoded.opcode, decoded.operands)?;
            }
            writeln!(self.out)?;
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

/// Renders a cycle as one JSON object per line (JSON Lines), keys per
/// spec §4.13: `note`, `pc`, `int`, `fp`, `io`, `opEvents`,
/// `memoryEvents`, `trapEvents`.
pub struct JsonCyclePrinter<W: Write, D: Disassembler> {
    out: W,
    disassembler: Option<D>,
}

impl<W: Write, D: Disassembler> JsonCyclePrinter<W, D> {
    pub fn new(out: W, disassembler: Option<D>) -> Self {
        Self { out, disassembler }
    }

    pub fn print_cycle(&mut self, cycle: &dyn Cycle, note: Option<&str>) -> Result<()> {
        let virt_pc = cycle.pc(false).ok();
        let pc = virt_pc.map(|virt| {
            let phys = cycle.pc(true).unwrap_or(virt);
            json!({ "virtual": format!("{virt:x}"), "physical": format!("{phys:x}") })
        });

        let int = cycle.has_int_reg().then(|| {
            (0..32)
                .map(|i| format!("{:x}", cycle.int_reg(i).unwrap_or(0)))
                .collect::<Vec<_>>()
        });

        let fp = cycle.has_fp_reg().then(|| {
            (0..32)
                .map(|i| format!("{:x}", cycle.fp_reg(i).unwrap_or(0)))
                .collect::<Vec<_>>()
        });

        let io = if cycle.has_io() {
            Some(format!("{:x}", cycle.copy_io()?.host_io))
        } else {
            None
        };

        let mut op_events = Vec::with_capacity(cycle.op_event_count());
        for i in 0..cycle.op_event_count() {
            let e = cycle.copy_op_event(i)?;
            let asm = self.disassembler.as_ref().map(|d| {
                let decoded = d.disassemble(e.insn, virt_pc.unwrap_or(0));
                format!("{} {}", decoded.opcode, decoded.operands)
            });
            op_events.push(json!({
                "insn": format!("{:x}", e.insn),
                "priv": priv_literal(e.priv_level),
                "asm": asm,
            }));
        }

        let mut memory_events = Vec::with_capacity(cycle.memory_event_count());
        for i in 0..cycle.memory_event_count() {
            let e = cycle.copy_memory_event(i)?;
            memory_events.push(json!({
                "accessType": access_literal(e.access_type),
                "size": e.size,
                "value": format!("{:x}", e.value),
                "vaddr": format!("{:x}", e.vaddr),
                "paddr": format!("{:x}", e.paddr),
            }));
        }

        let mut trap_events = Vec::with_capacity(cycle.trap_event_count());
        for i in 0..cycle.trap_event_count() {
            let e = cycle.copy_trap_event(i)?;
            trap_events.push(json!({
                "trapType": trap_type_literal(e.trap_type),
                "from": priv_literal(e.from),
                "to": priv_literal(e.to),
                "cause": e.cause,
                "value": format!("{:x}", e.value),
            }));
        }

        let value = json!({
            "note": note,
            "pc": pc,
            "int": int,
            "fp": fp,
            "io": io,
            "opEvents": op_events,
            "memoryEvents": memory_events,
            "trapEvents": trap_events,
        });

        writeln!(self.out, "{value}")?;
        Ok(())
    }
}

/// Renders one hex PC per line. Used by `dump-pc`.
pub struct PcOnlyPrinter<W: Write> {
    out: W,
    physical: bool,
}

impl<W: Write> PcOnlyPrinter<W> {
    pub fn new(out: W, physical: bool) -> Self {
        Self { out, physical }
    }

    pub fn print_cycle(&mut self, cycle: &dyn Cycle) -> Result<()> {
        let pc = cycle.pc(self.physical)?;
        writeln!(self.out, "{pc:x}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disasm::HexDisassembler;
    use rvtrace_core::{BasicInfo, ContainerCycle, CycleBuilder, CycleConfig, CycleView, NodeKind, PcPair};

    fn sample_cycle_bytes() -> Vec<u8> {
        let mut cfg = CycleConfig::new();
        cfg.set_count(NodeKind::BasicInfo, 1);
        cfg.set_count(NodeKind::Pc64, 1);
        let mut b = CycleBuilder::new(&cfg).unwrap();
        b.set_basic_info(BasicInfo { cycle: 3, xlen: 64, pc: 0x1000 }).unwrap();
        b.set_pc64(PcPair { virt: 0x1000, phys: 0x2000 }).unwrap();
        b.into_bytes()
    }

    #[test]
    fn text_printer_emits_header_and_break() {
        let bytes = sample_cycle_bytes();
        let view = CycleView::new(&bytes).unwrap();
        let cycle = ContainerCycle::new(view);

        let mut buf = Vec::new();
        {
            let mut printer = TextCyclePrinter::new(&mut buf, 64, None::<HexDisassembler>);
            printer.print_cycle(&cycle, None).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("XLEN 64\n"));
        assert!(text.contains("PC 1000 2000\n"));
        assert!(text.trim_end().ends_with("BREAK"));
    }

    #[test]
    fn json_printer_emits_pc_object() {
        let bytes = sample_cycle_bytes();
        let view = CycleView::new(&bytes).unwrap();
        let cycle = ContainerCycle::new(view);

        let mut buf = Vec::new();
        {
            let mut printer = JsonCyclePrinter::new(&mut buf, None::<HexDisassembler>);
            printer.print_cycle(&cycle, Some("hi")).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["note"], "hi");
        assert_eq!(value["pc"]["virtual"], "1000");
        assert_eq!(value["pc"]["physical"], "2000");
    }

    #[test]
    fn pc_only_printer_emits_hex_line() {
        let bytes = sample_cycle_bytes();
        let view = CycleView::new(&bytes).unwrap();
        let cycle = ContainerCycle::new(view);

        let mut buf = Vec::new();
        PcOnlyPrinter::new(&mut buf, true).print_cycle(&cycle).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "2000\n");
    }
}
