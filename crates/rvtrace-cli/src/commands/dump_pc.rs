//! `dump-pc` — print one PC per line, `[start_cycle, start_cycle+count)`.

use std::io::{self, Write as _};
use std::path::Path;

use rvtrace_fmt::PcOnlyPrinter;

use crate::error::CliResult;
use crate::source::TraceSource;

pub fn run(path: &Path, start_cycle: u32, count: Option<u32>, virtual_pc: bool) -> CliResult<()> {
    let mut source = TraceSource::open(path)?;
    let stop_at = count.map(|c| start_cycle.saturating_add(c));

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    let mut printer = PcOnlyPrinter::new(&mut lock, !virtual_pc);

    source.walk(|index, cycle| {
        if index < start_cycle {
            return Ok(true);
        }
        if let Some(stop) = stop_at {
            if index >= stop {
                return Ok(false);
            }
        }
        printer.print_cycle(cycle)?;
        Ok(true)
    })?;

    lock.flush()?;
    Ok(())
}
