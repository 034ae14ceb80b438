//! CLI surface: `dump`, `dump-pc`, `conv`, `check-io`, per spec §6.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "rvtrace")]
#[command(about = "Inspect, filter, and convert cycle-accurate RISC-V execution traces")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print cycles from a trace, optionally filtered
    Dump {
        #[arg(value_name = "TRACE")]
        path: PathBuf,

        /// First cycle index to print, inclusive
        #[arg(long, default_value_t = 0)]
        begin: u32,

        /// Number of cycles to print, starting at --begin
        #[arg(long)]
        count: Option<u32>,

        /// Last cycle index to print, exclusive
        #[arg(long)]
        end: Option<u32>,

        /// Filter DSL: `<tag>:<hex>`, tag in {P, PP, L, LP, S, SP, A, AP}
        #[arg(long)]
        filter: Option<String>,

        /// Print JSON Lines instead of the text grammar
        #[arg(short = 'j', long = "json")]
        json: bool,
    },
    /// Print one PC per line
    DumpPc {
        #[arg(value_name = "TRACE")]
        path: PathBuf,

        /// First cycle index to print, inclusive
        #[arg(long, default_value_t = 0)]
        start_cycle: u32,

        /// Number of cycles to print, starting at --start-cycle
        #[arg(long)]
        count: Option<u32>,

        /// Print the virtual PC instead of the physical one
        #[arg(long = "virtual")]
        virtual_pc: bool,
    },
    /// Convert any readable trace into a sharded index trace
    Conv {
        #[arg(value_name = "IN")]
        input: PathBuf,

        #[arg(value_name = "OUT_BASE")]
        out_base: PathBuf,
    },
    /// Walk each trace to its last cycle and check the host I/O word
    CheckIo {
        #[arg(value_name = "TRACE", required = true)]
        traces: Vec<PathBuf>,
    },
}
