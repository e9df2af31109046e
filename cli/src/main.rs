mod cli;
mod commands;
mod io;

use cli::{Cli, Commands};
use commands::assign;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the `-v` count.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Assign(args) => assign::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
