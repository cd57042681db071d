//! `ccline toolchain` command

use anyhow::Result;

use super::Session;
use crate::cli::{ToolchainArgs, ToolchainCommands};
use ccline::builder::compiler::OptionsFileMode;
use ccline::builder::toolchain::toolchain_for;

pub fn execute(args: ToolchainArgs, session: &Session) -> Result<()> {
    match args.command {
        ToolchainCommands::Show => show_toolchain(session),
    }
}

fn show_toolchain(session: &Session) -> Result<()> {
    let settings = &session.settings;
    let platform = settings.platform();
    let toolchain = toolchain_for(platform);
    let compiler = settings.compiler_settings(&session.root);

    println!("Toolchain:");
    println!();
    println!("  Platform:      {}", platform);
    println!("  Compiler:      {}", compiler.program.display());

    let options_file = match compiler.options_file {
        OptionsFileMode::Always => "always".to_string(),
        OptionsFileMode::Never => "never".to_string(),
        OptionsFileMode::Threshold(limit) => format!("above {} characters", limit),
    };
    println!(
        "  Options file:  {} ({} syntax)",
        options_file,
        toolchain.options_file_syntax().as_str()
    );
    if compiler.keep_source_on_command_line {
        println!("                 source kept on the command line");
    }
    println!("  Scratch dir:   {}", compiler.scratch_dir.display());
    println!("  Object dir:    {}", settings.object_dir(&session.root).display());
    println!(
        "  Object ext:    {}",
        settings
            .object_extension
            .as_deref()
            .unwrap_or_else(|| toolchain.object_extension())
    );
    match settings.jobs {
        Some(jobs) => println!("  Jobs:          {}", jobs),
        None => println!("  Jobs:          one per CPU"),
    }
    if !settings.args.is_empty() {
        println!("  Extra args:    {}", settings.args.join(" "));
    }

    if !compiler.env.is_empty() {
        println!();
        println!("Environment:");
        for (key, value) in &compiler.env {
            println!("  {}={}", key, value);
        }
    }

    println!();
    println!("Config files:");
    if session.config_files.is_empty() {
        println!("  (none, using defaults)");
    }
    for path in &session.config_files {
        println!("  {}", path.display());
    }

    Ok(())
}
