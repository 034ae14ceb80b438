//! `dump` — print cycles `[begin, min(begin+count, end))` that pass an
//! optional filter, as the text grammar or as JSON Lines.

use std::io::{self, Write as _};
use std::path::Path;

use rvtrace_fmt::{parse_filter, Filter, HexDisassembler, JsonCyclePrinter, TextCyclePrinter};

use crate::error::CliResult;
use crate::source::TraceSource;

pub fn run(
    path: &Path,
    begin: u32,
    count: Option<u32>,
    end: Option<u32>,
    filter: Option<&str>,
    json: bool,
) -> CliResult<()> {
    let mut source = TraceSource::open(path)?;
    let filter: Box<dyn Filter> = parse_filter(filter.unwrap_or(""))?;

    let stop_at = match (count, end) {
        (Some(c), Some(e)) => Some(begin.saturating_add(c).min(e)),
        (Some(c), None) => Some(begin.saturating_add(c)),
        (None, Some(e)) => Some(e),
        (None, None) => None,
    };

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    let xlen = source.xlen();
    let disassembler = Some(HexDisassembler);

    if json {
        let mut printer = JsonCyclePrinter::new(&mut lock, disassembler);
        source.walk(|index, cycle| {
            if index < begin {
                return Ok(true);
            }
            if let Some(stop) = stop_at {
                if index >= stop {
                    return Ok(false);
                }
            }
            if filter.apply(cycle) {
                printer.print_cycle(cycle, None)?;
            }
            Ok(true)
        })?;
    } else {
        let mut printer = TextCyclePrinter::new(&mut lock, xlen, disassembler);
        source.walk(|index, cycle| {
            if index < begin {
                return Ok(true);
            }
            if let Some(stop) = stop_at {
                if index >= stop {
                    return Ok(false);
                }
            }
            if filter.apply(cycle) {
                printer.print_cycle(cycle, None)?;
            }
            Ok(true)
        })?;
    }
    lock.flush()?;
    Ok(())
}
