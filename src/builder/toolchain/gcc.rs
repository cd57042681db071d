//! GCC/Clang toolchain implementation.

use std::path::Path;

use crate::builder::options_file::OptionsFileSyntax;
use crate::core::spec::CompileSpec;
use crate::util::fs::relativize;

use super::{macro_arg, note_partial_pch, Toolchain, ToolchainPlatform};

/// GCC-compatible toolchain (gcc, clang, apple-clang).
#[derive(Debug, Clone)]
pub struct GccToolchain {
    /// Compiler family (gcc, clang, apple-clang)
    pub family: ToolchainPlatform,
}

impl GccToolchain {
    /// Create a new GCC-style toolchain.
    pub fn new(family: ToolchainPlatform) -> Self {
        GccToolchain { family }
    }
}

impl Toolchain for GccToolchain {
    fn platform(&self) -> ToolchainPlatform {
        self.family
    }

    fn common_args(&self, spec: &CompileSpec) -> Vec<String> {
        let mut args = vec![
            "-x".to_string(),
            spec.language.as_str().to_string(),
            "-c".to_string(),
        ];

        if spec.debuggable {
            args.push("-g".to_string());
        }
        if spec.optimized {
            args.push("-O3".to_string());
        }

        for m in &spec.macros {
            args.push(macro_arg("-D", m));
        }

        for dir in &spec.include_dirs {
            args.push(format!("-I{}", relativize(&spec.working_dir, dir)));
        }

        args
    }

    fn output_args(&self, spec: &CompileSpec, output_file: &Path) -> Vec<String> {
        // Debug info lives in the object file; no separate database.
        vec![
            "-o".to_string(),
            relativize(&spec.working_dir, output_file),
        ]
    }

    fn pch_args(&self, spec: &CompileSpec) -> Vec<String> {
        note_partial_pch(spec);

        // The compiler picks up `<header>.gch` next to the header by itself.
        match spec.precompiled_header() {
            Some((header, _)) => vec!["-include".to_string(), header.to_string()],
            None => Vec::new(),
        }
    }

    fn options_file_syntax(&self) -> OptionsFileSyntax {
        OptionsFileSyntax::Gnu
    }

    fn object_extension(&self) -> &str {
        "o"
    }
}
