//! Command dispatch: maps a parsed [`crate::cli::Commands`] variant to its
//! handler and turns the result into a process exit code.

mod check_io;
mod conv;
mod dump;
mod dump_pc;

use crate::cli::{Cli, Commands, EXIT_FAILURE, EXIT_SUCCESS};

pub fn run(cli: &Cli) -> i32 {
    let result = match &cli.command {
        Commands::Dump {
            path,
            begin,
            count,
            end,
            filter,
            json,
        } => dump::run(path, *begin, *count, *end, filter.as_deref(), *json),
        Commands::DumpPc {
            path,
            start_cycle,
            count,
            virtual_pc,
        } => dump_pc::run(path, *start_cycle, *count, *virtual_pc),
        Commands::Conv { input, out_base } => conv::run(input, out_base),
        Commands::CheckIo { traces } => return check_io::run(traces),
    };

    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            eprintln!("error: {err}");
            EXIT_FAILURE
        }
    }
}
