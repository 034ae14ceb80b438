//! The decoder seam. The RISC-V instruction decoder itself is out of
//! scope for this crate (spec §1 names it an external collaborator); the
//! printers depend only on this trait, so a real decoder can be plugged
//! in without touching `rvtrace-fmt`.

/// One decoded instruction, as printers want to render it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstr {
    pub opcode: String,
    pub operands: String,
}

/// Decodes a raw instruction word into a printable mnemonic + operands.
/// Implementations are free to ignore `pc` (only needed for PC-relative
/// operand rendering, e.g. branch targets).
pub trait Disassembler {
    fn disassemble(&self, insn: u32, pc: u64) -> DecodedInstr;
}

/// The only built-in implementation: renders the raw opcode as hex, no
/// operand decoding. Used when no real decoder is wired in.
pub struct HexDisassembler;

impl Disassembler for HexDisassembler {
    fn disassemble(&self, insn: u32, _pc: u64) -> DecodedInstr {
        DecodedInstr {
            opcode: format!("{insn:08x}"),
            operands: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_disassembler_formats_opcode_only() {
        let decoded = HexDisassembler.disassemble(0x0000_0013, 0x1000);
        assert_eq!(decoded.opcode, "00000013");
        assert!(decoded.operands.is_empty());
    }
}
