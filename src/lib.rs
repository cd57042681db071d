//! ccline - Compiler command-line assembly for C and C++
//!
//! This crate turns a description of one compilation into the exact
//! argument list a GCC-compatible or Visual C++ compiler expects, moves long
//! argument lists into options files, and runs the compiler.

pub mod builder;
pub mod core;
pub mod util;

/// Test doubles for ccline unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides recording implementations of the invocation
/// worker and build operation listener.
#[cfg(test)]
pub mod test_support;

pub use self::builder::{CompileError, NativeCompiler, Toolchain, ToolchainPlatform};
pub use self::core::{CompileSpec, Language, Macro};
