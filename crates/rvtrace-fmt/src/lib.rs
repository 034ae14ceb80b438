//! Cycle filtering and printing: the consumer-facing layer that sits
//! between a trace reader and a terminal or file.
//!
//! A [`filter::Filter`] decides whether a cycle should be shown; a printer
//! (`printer`) renders the ones that pass. Disassembly is delegated to
//! the [`disasm::Disassembler`] trait rather than a concrete RISC-V
//! decoder — the decoder itself is out of scope (spec §1 names it an
//! external collaborator).

mod disasm;
mod error;
mod filter;
mod printer;

pub use disasm::{DecodedInstr, Disassembler, HexDisassembler};
pub use error::{Error, Result};
pub use filter::{parse_filter, DefaultFilter, Filter, MemoryAccessFilter, PcFilter};
pub use printer::{JsonCyclePrinter, PcOnlyPrinter, TextCyclePrinter};
