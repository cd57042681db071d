//! Compile specifications.
//!
//! A [`CompileSpec`] is the normalized description of one source-file
//! compilation request. It is built once per compile unit, handed to the
//! compiler driver, and never mutated by it: argument builders only read
//! from the spec and return fresh argument lists.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::language::Language;

/// A preprocessor macro definition (`NAME` or `NAME=value`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Macro {
    /// Macro name
    pub name: String,
    /// Optional macro value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Macro {
    /// A macro without a value (`-DNAME`).
    pub fn flag(name: impl Into<String>) -> Self {
        Macro {
            name: name.into(),
            value: None,
        }
    }

    /// A macro with a value (`-DNAME=value`).
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Macro {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

/// Description of a single compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileSpec {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Directory the compiler runs in; path arguments are relative to it
    pub working_dir: PathBuf,
    /// Include directories
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor macros
    #[serde(default)]
    pub macros: Vec<Macro>,
    /// Source language
    #[serde(default)]
    pub language: Language,
    /// Emit debug information
    #[serde(default)]
    pub debuggable: bool,
    /// Enable optimizations
    #[serde(default)]
    pub optimized: bool,
    /// Name of the last header included by the precompiled header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precompiled_header: Option<String>,
    /// Compiled precompiled-header object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precompiled_header_object_file: Option<PathBuf>,
    /// Free-form user arguments, passed after the toolchain-generated ones
    #[serde(default)]
    pub args: Vec<String>,
}

impl CompileSpec {
    /// Create a spec compiling `source` into `output` from `working_dir`.
    pub fn new(
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        CompileSpec {
            source: source.into(),
            output: output.into(),
            working_dir: working_dir.into(),
            include_dirs: Vec::new(),
            macros: Vec::new(),
            language: Language::default(),
            debuggable: false,
            optimized: false,
            precompiled_header: None,
            precompiled_header_object_file: None,
            args: Vec::new(),
        }
    }

    /// Add an include directory.
    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Add a macro definition.
    pub fn define(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.macros.push(match value {
            Some(value) => Macro::with_value(name, value),
            None => Macro::flag(name),
        });
        self
    }

    /// Set the source language.
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Enable or disable debug information.
    pub fn debuggable(mut self, debuggable: bool) -> Self {
        self.debuggable = debuggable;
        self
    }

    /// Enable or disable optimizations.
    pub fn optimized(mut self, optimized: bool) -> Self {
        self.optimized = optimized;
        self
    }

    /// Reuse a precompiled header: both the header name and its object file.
    pub fn precompiled(mut self, header: impl Into<String>, object_file: impl Into<PathBuf>) -> Self {
        self.precompiled_header = Some(header.into());
        self.precompiled_header_object_file = Some(object_file.into());
        self
    }

    /// Append a free-form user argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Precompiled-header state, only when both halves are present.
    pub fn precompiled_header(&self) -> Option<(&str, &Path)> {
        match (
            &self.precompiled_header,
            &self.precompiled_header_object_file,
        ) {
            (Some(header), Some(object)) => Some((header.as_str(), object.as_path())),
            _ => None,
        }
    }

    /// True when exactly one of the two precompiled-header fields is set.
    ///
    /// Such specs compile without PCH arguments rather than failing.
    pub fn has_partial_precompiled_header(&self) -> bool {
        self.precompiled_header.is_some() != self.precompiled_header_object_file.is_some()
    }

    /// Short human-readable name for logs and build operations.
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}
