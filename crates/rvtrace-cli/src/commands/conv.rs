//! `conv` — convert any readable trace (binary, index, text, or GDB log)
//! into a sharded index trace of logger-form shards.

use std::path::Path;

use rvtrace_core::{Cycle, CycleLogger, FpRegValue, IoState};
use rvtrace_io::IndexTraceWriter;

use crate::error::CliResult;
use crate::source::TraceSource;

/// Generous enough for a cycle with a full register file, several memory
/// events, and a handful of traps; `conv` doesn't know a source cycle's
/// full shape ahead of time the way a live producer would.
const SHARD_CYCLE_CAPACITY: u32 = 1 << 16;

fn encode(cycle: &dyn Cycle) -> CliResult<Vec<u8>> {
    let xlen = cycle.xlen();
    let pc = cycle.pc(false).or_else(|_| cycle.pc(true)).unwrap_or(0);
    let mut logger = CycleLogger::new(SHARD_CYCLE_CAPACITY, cycle.cycle_index(), xlen, pc)?;

    if cycle.has_int_reg() {
        if xlen == 64 {
            let mut regs = [0u64; 32];
            for (i, r) in regs.iter_mut().enumerate() {
                *r = cycle.int_reg(i)?;
            }
            logger.add_int_reg64(&regs)?;
        } else {
            let mut regs = [0u32; 32];
            for (i, r) in regs.iter_mut().enumerate() {
                *r = cycle.int_reg(i)? as u32;
            }
            logger.add_int_reg32(&regs)?;
        }
    }

    if cycle.has_fp_reg() {
        let mut regs = [FpRegValue::U64(0); 32];
        for (i, r) in regs.iter_mut().enumerate() {
            *r = FpRegValue::U64(cycle.fp_reg(i)?);
        }
        logger.add_fp_reg(&regs)?;
    }

    if cycle.has_io() {
        let io = cycle.copy_io()?;
        logger.add_io(IoState { host_io: io.host_io })?;
    }

    for i in 0..cycle.op_event_count() {
        logger.add_op_event(cycle.copy_op_event(i)?)?;
    }

    for i in 0..cycle.memory_event_count() {
        logger.add_memory_event(cycle.copy_memory_event(i)?)?;
    }

    for i in 0..cycle.trap_event_count() {
        let event = cycle.copy_trap_event(i)?;
        if xlen == 64 {
            logger.add_trap64(event)?;
        } else {
            logger.add_trap32(event)?;
        }
    }

    Ok(logger.finish()?)
}

pub fn run(input: &Path, out_base: &Path) -> CliResult<()> {
    let mut source = TraceSource::open(input)?;
    let mut writer = IndexTraceWriter::new(out_base)?;

    source.walk(|_, cycle| {
        let bytes = encode(cycle)?;
        writer.write(&bytes)?;
        Ok(true)
    })?;

    Ok(())
}
