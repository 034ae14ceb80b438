//! `check-io` — walk each trace to its last cycle and check that the
//! host I/O word equals 1 (the riscv-tests pass/fail convention).

use std::path::{Path, PathBuf};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::error::CliResult;
use crate::source::TraceSource;

fn last_io_value(path: &Path) -> CliResult<Option<u32>> {
    let mut source = TraceSource::open(path)?;
    let mut last_io = None;
    source.walk(|_, cycle| {
        if cycle.has_io() {
            last_io = Some(cycle.copy_io()?.host_io);
        }
        Ok(true)
    })?;
    Ok(last_io)
}

pub fn run(traces: &[PathBuf]) -> i32 {
    let mut passed = 0usize;
    let total = traces.len();

    for path in traces {
        let outcome = last_io_value(path);
        match outcome {
            Ok(Some(1)) => {
                println!("[ PASS ] {}", path.display());
                passed += 1;
            }
            Ok(_) => {
                println!("[ FAILED ] {}", path.display());
            }
            Err(err) => {
                eprintln!("error: {err}");
                println!("[ FAILED ] {}", path.display());
            }
        }
    }

    println!("{passed}/{total} passed");
    if passed == total {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}
