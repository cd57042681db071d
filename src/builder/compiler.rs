//! Toolchain-agnostic compiler driver.
//!
//! [`NativeCompiler`] turns one [`CompileSpec`] into one compiler process:
//!
//! 1. **Assemble** the argument list through a fixed pipeline of pure stages:
//!    common args, output args, precompiled-header args, user args, and the
//!    source file last.
//! 2. **Spill** the list into an options file when the configured
//!    [`OptionsFileMode`] asks for it. A write failure ends the unit here,
//!    before any process is started.
//! 3. **Invoke** the compiler inside a build operation, holding a worker
//!    lease for the lifetime of the process.
//!
//! The driver holds no mutable state, so one instance can compile
//! independent specs from many threads at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::errors::CompileError;
use crate::builder::invocation::{CommandLineToolInvocation, InvocationOutput, InvocationWorker};
use crate::builder::lease::{WorkerLease, WorkerLeaseService};
use crate::builder::operation::BuildOperationExecutor;
use crate::builder::options_file::OptionsFileWriter;
use crate::builder::toolchain::Toolchain;
use crate::core::spec::CompileSpec;
use crate::util::fs::relativize;

/// Command-line length above which a threshold spill kicks in.
///
/// Windows limits `CreateProcess` command lines to 32767 characters.
pub const DEFAULT_COMMAND_LINE_LIMIT: usize = 32_000;

/// When to move arguments into an options file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionsFileMode {
    /// Always pass arguments through an options file.
    Always,
    /// Never use an options file.
    Never,
    /// Use an options file once the command line exceeds this many characters.
    Threshold(usize),
}

impl OptionsFileMode {
    /// Whether `program args...` should be spilled.
    pub fn should_spill(&self, program: &Path, args: &[String]) -> bool {
        match *self {
            OptionsFileMode::Always => true,
            OptionsFileMode::Never => false,
            OptionsFileMode::Threshold(limit) => command_line_length(program, args) > limit,
        }
    }
}

/// Length of the command line as the OS sees it (space separated).
pub fn command_line_length(program: &Path, args: &[String]) -> usize {
    program.as_os_str().len() + args.iter().map(|a| a.len() + 1).sum::<usize>()
}

/// Per-toolchain invocation settings.
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// The compiler program
    pub program: PathBuf,
    /// Extra environment variables for the compiler process
    pub env: Vec<(String, String)>,
    /// When to use an options file
    pub options_file: OptionsFileMode,
    /// Where options files are written
    pub scratch_dir: PathBuf,
    /// Leave the source file on the literal command line when spilling
    pub keep_source_on_command_line: bool,
}

impl CompilerSettings {
    /// Settings for `program` with no options file.
    pub fn new(program: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        CompilerSettings {
            program: program.into(),
            env: Vec::new(),
            options_file: OptionsFileMode::Never,
            scratch_dir: scratch_dir.into(),
            keep_source_on_command_line: false,
        }
    }

    /// Set the options-file mode.
    pub fn options_file(mut self, mode: OptionsFileMode) -> Self {
        self.options_file = mode;
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Keep the source file out of the options file.
    pub fn keep_source_on_command_line(mut self, keep: bool) -> Self {
        self.keep_source_on_command_line = keep;
        self
    }
}

/// A pure transformation applied to every spec before assembly.
pub type SpecTransform = Arc<dyn Fn(&CompileSpec) -> CompileSpec + Send + Sync>;

/// One assembly stage: a pure function of the toolchain and the spec.
type ArgsStage = fn(&dyn Toolchain, &CompileSpec) -> Vec<String>;

/// Assembly stages, in command-line order.
const ARGS_PIPELINE: [ArgsStage; 5] = [common_args, output_args, pch_args, user_args, source_arg];

fn common_args(toolchain: &dyn Toolchain, spec: &CompileSpec) -> Vec<String> {
    toolchain.common_args(spec)
}

fn output_args(toolchain: &dyn Toolchain, spec: &CompileSpec) -> Vec<String> {
    toolchain.output_args(spec, &spec.output)
}

fn pch_args(toolchain: &dyn Toolchain, spec: &CompileSpec) -> Vec<String> {
    toolchain.pch_args(spec)
}

fn user_args(_: &dyn Toolchain, spec: &CompileSpec) -> Vec<String> {
    spec.args.clone()
}

fn source_arg(_: &dyn Toolchain, spec: &CompileSpec) -> Vec<String> {
    vec![relativize(&spec.working_dir, &spec.source)]
}

/// Assemble the full, unspilled argument list for `spec`.
pub fn assemble_args(toolchain: &dyn Toolchain, spec: &CompileSpec) -> Vec<String> {
    ARGS_PIPELINE
        .iter()
        .flat_map(|stage| stage(toolchain, spec))
        .collect()
}

/// Result of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// Source file compiled
    pub source: PathBuf,
    /// Object file produced
    pub output: PathBuf,
    /// Arguments actually passed to the compiler
    pub args: Vec<String>,
    /// Options file referenced by `args`, if one was written
    pub options_file: Option<PathBuf>,
    /// Compiler output (warnings, banners)
    pub invocation: InvocationOutput,
}

/// Drives one toolchain's compiler for individual specs.
pub struct NativeCompiler {
    toolchain: Arc<dyn Toolchain>,
    settings: CompilerSettings,
    spec_transform: Option<SpecTransform>,
    operations: Arc<BuildOperationExecutor>,
    leases: Arc<dyn WorkerLeaseService>,
    worker: Arc<dyn InvocationWorker>,
}

impl NativeCompiler {
    /// Create a compiler driver.
    pub fn new(
        toolchain: Arc<dyn Toolchain>,
        settings: CompilerSettings,
        operations: Arc<BuildOperationExecutor>,
        leases: Arc<dyn WorkerLeaseService>,
        worker: Arc<dyn InvocationWorker>,
    ) -> Self {
        NativeCompiler {
            toolchain,
            settings,
            spec_transform: None,
            operations,
            leases,
            worker,
        }
    }

    /// Apply `transform` to every spec before assembly.
    pub fn with_spec_transform(mut self, transform: SpecTransform) -> Self {
        self.spec_transform = Some(transform);
        self
    }

    /// The toolchain this driver assembles arguments for.
    pub fn toolchain(&self) -> &dyn Toolchain {
        &*self.toolchain
    }

    /// The invocation settings.
    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// The spec as the pipeline sees it, after the spec transform.
    pub fn prepare(&self, spec: &CompileSpec) -> CompileSpec {
        match &self.spec_transform {
            Some(transform) => transform(spec),
            None => spec.clone(),
        }
    }

    /// The argument list for `spec`, without spilling or invoking anything.
    pub fn assemble(&self, spec: &CompileSpec) -> Vec<String> {
        assemble_args(&*self.toolchain, &self.prepare(spec))
    }

    /// Compile `spec`, blocking until the compiler exits.
    pub fn compile(&self, spec: &CompileSpec) -> Result<CompileOutcome, CompileError> {
        let spec = self.prepare(spec);
        let scope = self
            .operations
            .start(format!("Compile {}", spec.display_name()), &spec.source);

        let result = self.run(&spec);
        match &result {
            Ok(_) => scope.succeed(),
            Err(e) => scope.fail(e.to_string()),
        }
        result
    }

    fn run(&self, spec: &CompileSpec) -> Result<CompileOutcome, CompileError> {
        let mut args = assemble_args(&*self.toolchain, spec);

        let options_file = if self
            .settings
            .options_file
            .should_spill(&self.settings.program, &args)
        {
            self.spill(spec, &mut args)?
        } else {
            None
        };

        let invocation = CommandLineToolInvocation {
            program: self.settings.program.clone(),
            args,
            working_dir: spec.working_dir.clone(),
            env: self.settings.env.clone(),
        };

        tracing::debug!(
            "Compiling {} -> {} ({})",
            spec.source.display(),
            spec.output.display(),
            self.toolchain.platform()
        );
        tracing::debug!(
            "Running `{}`",
            invocation.display_command(self.toolchain.options_file_syntax())
        );

        let output = {
            let _lease = WorkerLease::acquire(&*self.leases);
            self.worker.invoke(&invocation)?
        };

        if !output.success {
            return Err(CompileError::InvocationFailed {
                source_file: spec.source.clone(),
                code: output.code,
                output: output.combined(),
            });
        }

        Ok(CompileOutcome {
            source: spec.source.clone(),
            output: spec.output.clone(),
            args: invocation.args,
            options_file,
            invocation: output,
        })
    }

    fn spill(
        &self,
        spec: &CompileSpec,
        args: &mut Vec<String>,
    ) -> Result<Option<PathBuf>, CompileError> {
        let syntax = self.toolchain.options_file_syntax();
        let writer = OptionsFileWriter::for_spec(syntax, &self.settings.scratch_dir, spec);

        if self.settings.keep_source_on_command_line {
            let source = relativize(&spec.working_dir, &spec.source);
            writer
                .keep_on_command_line(move |arg| arg == source)
                .apply(args)
        } else {
            writer.apply(args)
        }
    }
}
