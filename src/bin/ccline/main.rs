//! ccline CLI - Assemble and run C/C++ compiler command lines

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::Session;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("ccline=debug")
    } else {
        EnvFilter::new("ccline=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let session = Session::load(cli.config.as_deref(), cli.toolchain, cli.verbose)?;

    // Execute command
    match cli.command {
        Commands::Args(args) => commands::args::execute(args, &session),
        Commands::Compile(args) => commands::compile::execute(args, &session),
        Commands::Options(args) => commands::options::execute(args, &session),
        Commands::Toolchain(args) => commands::toolchain::execute(args, &session),
    }
}
