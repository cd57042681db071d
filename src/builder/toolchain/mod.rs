//! Toolchain abstraction for C/C++ compilers.
//!
//! Each toolchain family knows the exact flag spellings its compiler expects:
//! how the output file is named, where debug symbols go, and how a
//! precompiled header is reused. Builders are pure functions of a
//! [`CompileSpec`]; they never write files or spawn processes.
//!
//! The family is chosen once, from configuration, via [`toolchain_for`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::options_file::OptionsFileSyntax;
use crate::core::spec::{CompileSpec, Macro};

mod gcc;
mod msvc;

pub use gcc::GccToolchain;
pub use msvc::MsvcToolchain;

/// The platform/family of a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolchainPlatform {
    /// GCC (GNU Compiler Collection)
    Gcc,
    /// Clang/LLVM
    Clang,
    /// Apple Clang (macOS)
    AppleClang,
    /// Microsoft Visual C++
    Msvc,
}

impl ToolchainPlatform {
    /// Get the platform name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainPlatform::Gcc => "gcc",
            ToolchainPlatform::Clang => "clang",
            ToolchainPlatform::AppleClang => "apple-clang",
            ToolchainPlatform::Msvc => "msvc",
        }
    }

    /// The platform native to the host.
    pub fn host_default() -> Self {
        if cfg!(windows) {
            ToolchainPlatform::Msvc
        } else if cfg!(target_os = "macos") {
            ToolchainPlatform::AppleClang
        } else {
            ToolchainPlatform::Gcc
        }
    }

    /// The compiler program used when none is configured.
    pub fn default_compiler(&self) -> &'static str {
        match self {
            ToolchainPlatform::Gcc => "gcc",
            ToolchainPlatform::Clang | ToolchainPlatform::AppleClang => "clang",
            ToolchainPlatform::Msvc => "cl.exe",
        }
    }
}

impl fmt::Display for ToolchainPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolchainPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gcc" => Ok(ToolchainPlatform::Gcc),
            "clang" => Ok(ToolchainPlatform::Clang),
            "apple-clang" => Ok(ToolchainPlatform::AppleClang),
            "msvc" | "visual-cpp" => Ok(ToolchainPlatform::Msvc),
            other => Err(format!("unknown toolchain `{}`", other)),
        }
    }
}

/// Trait for toolchain implementations.
///
/// Each toolchain knows how to spell compile arguments for its specific
/// compiler. Argument lists are returned in the order they must appear.
pub trait Toolchain: Send + Sync {
    /// Get the toolchain platform.
    fn platform(&self) -> ToolchainPlatform;

    /// Arguments shared by every compilation: compile-only mode, language
    /// mode, debug/optimization switches, macros and include directories.
    fn common_args(&self, spec: &CompileSpec) -> Vec<String>;

    /// Arguments naming the object file (and debug database, if any).
    fn output_args(&self, spec: &CompileSpec, output_file: &Path) -> Vec<String>;

    /// Arguments reusing a precompiled header.
    ///
    /// Empty unless both halves of the precompiled-header state are set.
    fn pch_args(&self, spec: &CompileSpec) -> Vec<String>;

    /// Quoting rules for this compiler's options files.
    fn options_file_syntax(&self) -> OptionsFileSyntax;

    /// Get the object file extension.
    fn object_extension(&self) -> &str;
}

/// Select the toolchain implementation for a platform.
pub fn toolchain_for(platform: ToolchainPlatform) -> Arc<dyn Toolchain> {
    match platform {
        ToolchainPlatform::Msvc => Arc::new(MsvcToolchain::new()),
        family => Arc::new(GccToolchain::new(family)),
    }
}

/// Render a macro with the given flag prefix (`-D` or `/D`).
pub(crate) fn macro_arg(prefix: &str, m: &Macro) -> String {
    format!("{}{}", prefix, m)
}

/// Log, once per spec, that half-set precompiled-header state is being ignored.
pub(crate) fn note_partial_pch(spec: &CompileSpec) {
    if spec.has_partial_precompiled_header() {
        tracing::debug!(
            "Ignoring incomplete precompiled header settings for {} (header: {:?}, object: {:?})",
            spec.source.display(),
            spec.precompiled_header,
            spec.precompiled_header_object_file
        );
    }
}
