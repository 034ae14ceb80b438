//! rvtrace - inspect, filter, and convert cycle-accurate execution traces

mod cli;
mod commands;
mod error;
mod source;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rvtrace=info".parse().unwrap()))
        .with_target(false)
        .init();

    let exit_code = commands::run(&cli);
    std::process::exit(exit_code);
}
