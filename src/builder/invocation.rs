//! Command-line tool invocation.
//!
//! The driver hands a fully assembled command line to an
//! [`InvocationWorker`] and blocks until it reports back.

use std::path::PathBuf;

use crate::builder::errors::CompileError;
use crate::builder::options_file::OptionsFileSyntax;
use crate::util::process::ProcessBuilder;

/// A fully assembled compiler command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLineToolInvocation {
    /// The program to run (e.g., "gcc", "cl.exe")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Directory to run in
    pub working_dir: PathBuf,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
}

impl CommandLineToolInvocation {
    /// Display the command, quoting each token with `syntax` so the line can
    /// be pasted back into a shell of the matching platform.
    pub fn display_command(&self, syntax: OptionsFileSyntax) -> String {
        let program = self.program.to_string_lossy();
        std::iter::once(syntax.quote(&program).into_owned())
            .chain(self.args.iter().map(|arg| syntax.quote(arg).into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_process(&self) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program)
            .args(&self.args)
            .cwd(&self.working_dir);
        for (key, value) in &self.env {
            cmd = cmd.env(key, value);
        }
        cmd
    }
}

/// What a finished compiler process reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutput {
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
    /// Whether the process exited successfully
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationOutput {
    /// A successful invocation with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        InvocationOutput {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed invocation with the given exit code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        InvocationOutput {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// All captured output, stdout first.
    ///
    /// `cl.exe` writes its diagnostics to stdout, GCC to stderr, so both
    /// are kept.
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

/// Runs compiler command lines.
pub trait InvocationWorker: Send + Sync {
    /// Run the invocation to completion.
    ///
    /// Returns `Err` only when the process could not be run at all; a
    /// non-zero exit is reported through [`InvocationOutput::success`].
    fn invoke(&self, invocation: &CommandLineToolInvocation)
        -> Result<InvocationOutput, CompileError>;
}

/// Worker that spawns a real child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvocationWorker;

impl InvocationWorker for ProcessInvocationWorker {
    fn invoke(
        &self,
        invocation: &CommandLineToolInvocation,
    ) -> Result<InvocationOutput, CompileError> {
        let output = invocation
            .to_process()
            .exec()
            .map_err(|source| CompileError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(InvocationOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
