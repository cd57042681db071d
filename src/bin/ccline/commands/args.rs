//! `ccline args` command

use std::sync::Arc;

use anyhow::Result;

use super::Session;
use crate::cli::ArgsArgs;
use ccline::builder::invocation::CommandLineToolInvocation;
use ccline::builder::lease::WorkerLeases;
use ccline::builder::operation::TracingListener;
use ccline::core::load_spec;

pub fn execute(args: ArgsArgs, session: &Session) -> Result<()> {
    let naming = session.settings.object_naming(&session.root);
    let spec = load_spec(&args.unit, &naming)?;

    let compiler = session.native_compiler(Arc::new(TracingListener), WorkerLeases::new(1));
    let compiler_args = compiler.assemble(&spec);

    if args.command_line {
        let invocation = CommandLineToolInvocation {
            program: compiler.settings().program.clone(),
            args: compiler_args,
            working_dir: spec.working_dir.clone(),
            env: compiler.settings().env.clone(),
        };
        println!(
            "{}",
            invocation.display_command(compiler.toolchain().options_file_syntax())
        );
    } else {
        for arg in &compiler_args {
            println!("{}", arg);
        }
    }

    Ok(())
}
