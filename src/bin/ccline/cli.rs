//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ccline::builder::options_file::OptionsFileSyntax;
use ccline::builder::toolchain::ToolchainPlatform;

/// ccline - Assemble and run C/C++ compiler command lines
#[derive(Parser)]
#[command(name = "ccline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Toolchain config file to use instead of `.ccline/toolchain.toml`
    #[arg(long, global = true, env = "CCLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured toolchain family
    #[arg(long, global = true)]
    pub toolchain: Option<ToolchainPlatform>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the compiler arguments for a compile unit
    Args(ArgsArgs),

    /// Compile one or more compile units
    Compile(CompileArgs),

    /// Options file utilities
    Options(OptionsArgs),

    /// Toolchain configuration
    Toolchain(ToolchainArgs),
}

#[derive(Args)]
pub struct ArgsArgs {
    /// Compile unit file (TOML)
    pub unit: PathBuf,

    /// Print one command line, starting with the compiler
    #[arg(long)]
    pub command_line: bool,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Compile unit files or glob patterns
    #[arg(required = true)]
    pub units: Vec<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format for compile messages
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

/// How compile progress is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    /// Progress bar and log lines on stderr
    Human,
    /// One JSON event per line on stdout
    Json,
}

#[derive(Args)]
pub struct OptionsArgs {
    #[command(subcommand)]
    pub command: OptionsCommands,
}

#[derive(Subcommand)]
pub enum OptionsCommands {
    /// Print the arguments stored in an options file, one per line
    Decode(DecodeArgs),
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Options file to read
    pub file: PathBuf,

    /// Quoting rules (defaults to the configured toolchain's)
    #[arg(long)]
    pub syntax: Option<OptionsFileSyntax>,
}

#[derive(Args)]
pub struct ToolchainArgs {
    #[command(subcommand)]
    pub command: ToolchainCommands,
}

#[derive(Subcommand)]
pub enum ToolchainCommands {
    /// Show current toolchain configuration
    Show,
}
