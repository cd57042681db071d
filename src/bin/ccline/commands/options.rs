//! `ccline options` command

use anyhow::Result;

use super::Session;
use crate::cli::{DecodeArgs, OptionsArgs, OptionsCommands};
use ccline::builder::toolchain::toolchain_for;
use ccline::util::fs::read_to_string;

pub fn execute(args: OptionsArgs, session: &Session) -> Result<()> {
    match args.command {
        OptionsCommands::Decode(decode_args) => decode(decode_args, session),
    }
}

fn decode(args: DecodeArgs, session: &Session) -> Result<()> {
    let syntax = args.syntax.unwrap_or_else(|| {
        toolchain_for(session.settings.platform()).options_file_syntax()
    });
    let contents = read_to_string(&args.file)?;

    tracing::debug!("Decoding {} with {} rules", args.file.display(), syntax.as_str());
    for arg in syntax.split(&contents) {
        println!("{}", arg);
    }

    Ok(())
}
