//! Compile unit files.
//!
//! A unit file is a TOML description of one compilation, as written by an
//! upstream build tool or by hand:
//!
//! ```toml
//! source = "src/main.c"
//! working_dir = "."
//! debuggable = true
//! include_dirs = ["include"]
//! macros = [{ name = "UNICODE" }, { name = "LEVEL", value = "3" }]
//! ```
//!
//! Relative `working_dir` is resolved against the unit file's directory;
//! every other relative path is resolved against `working_dir`. A missing
//! `output` is filled in from the object file naming scheme.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::naming::ObjectFileNaming;
use crate::core::language::Language;
use crate::core::spec::{CompileSpec, Macro};
use crate::util::fs::{absolutize, read_to_string};

/// On-disk form of a [`CompileSpec`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileUnit {
    /// Source file
    pub source: PathBuf,
    /// Object file; derived from the source when absent
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Working directory; the unit file's directory when absent
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub macros: Vec<Macro>,
    /// Source language; guessed from the extension when absent
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub debuggable: bool,
    #[serde(default)]
    pub optimized: bool,
    #[serde(default)]
    pub precompiled_header: Option<String>,
    #[serde(default)]
    pub precompiled_header_object_file: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CompileUnit {
    /// Load a unit file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse compile unit: {}", path.display()))
    }

    /// Resolve paths and defaults into a [`CompileSpec`].
    ///
    /// `base_dir` is the directory the unit was loaded from.
    pub fn into_spec(self, base_dir: &Path, naming: &ObjectFileNaming) -> CompileSpec {
        let working_dir = match &self.working_dir {
            Some(dir) => absolutize(base_dir, dir),
            None => absolutize(base_dir, Path::new(".")),
        };

        let source = absolutize(&working_dir, &self.source);
        let output = match &self.output {
            Some(output) => absolutize(&working_dir, output),
            None => naming.object_file(&source),
        };
        let language = self.language.unwrap_or_else(|| {
            source
                .extension()
                .map(|ext| Language::from_extension(&ext.to_string_lossy()))
                .unwrap_or_default()
        });

        CompileSpec {
            include_dirs: self
                .include_dirs
                .iter()
                .map(|dir| absolutize(&working_dir, dir))
                .collect(),
            macros: self.macros,
            language,
            debuggable: self.debuggable,
            optimized: self.optimized,
            precompiled_header: self.precompiled_header,
            precompiled_header_object_file: self
                .precompiled_header_object_file
                .map(|p| absolutize(&working_dir, &p)),
            args: self.args,
            source,
            output,
            working_dir,
        }
    }
}

/// Load a unit file and resolve it against its own directory.
pub fn load_spec(path: &Path, naming: &ObjectFileNaming) -> Result<CompileSpec> {
    let unit = CompileUnit::load(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base_dir = if base_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        base_dir
    };
    let base_dir = std::path::absolute(base_dir)
        .with_context(|| format!("failed to resolve directory of {}", path.display()))?;
    Ok(unit.into_spec(&base_dir, naming))
}
