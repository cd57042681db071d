//! C/C++ compiler driver.
//!
//! This module turns compile specs into compiler invocations: argument
//! assembly per toolchain, options files, worker leases, build operations
//! and batch execution.

pub mod compiler;
pub mod errors;
pub mod events;
pub mod executor;
pub mod invocation;
pub mod lease;
pub mod naming;
pub mod operation;
pub mod options_file;
pub mod toolchain;

pub use compiler::{CompileOutcome, CompilerSettings, NativeCompiler, OptionsFileMode};
pub use errors::CompileError;
pub use events::{BuildEvent, JsonEventListener};
pub use executor::{CompileExecutor, CompileReport};
pub use invocation::{CommandLineToolInvocation, InvocationOutput, InvocationWorker, ProcessInvocationWorker};
pub use lease::{WorkerLease, WorkerLeaseService, WorkerLeases};
pub use naming::ObjectFileNaming;
pub use operation::{BuildOperationExecutor, BuildOperationListener, TracingListener};
pub use options_file::{OptionsFileSyntax, OptionsFileWriter};
pub use toolchain::{toolchain_for, GccToolchain, MsvcToolchain, Toolchain, ToolchainPlatform};
