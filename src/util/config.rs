//! Toolchain configuration files.
//!
//! ccline reads toolchain settings from two locations:
//! - Global: `~/.ccline/toolchain.toml` - User-wide defaults
//! - Project: `.ccline/toolchain.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Anything left unset
//! falls back to defaults for the host platform.
//!
//! ```toml
//! [toolchain]
//! platform = "msvc"
//! compiler = "C:/BuildTools/VC/bin/cl.exe"
//! options_file = "always"          # or "never", or { threshold = 8000 }
//! args = ["/W4"]
//!
//! [toolchain.env]
//! INCLUDE = "C:/BuildTools/VC/include"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::builder::compiler::{
    CompilerSettings, OptionsFileMode, SpecTransform, DEFAULT_COMMAND_LINE_LIMIT,
};
use crate::builder::naming::ObjectFileNaming;
use crate::builder::toolchain::{toolchain_for, ToolchainPlatform};
use crate::core::spec::CompileSpec;
use crate::util::fs::absolutize;
use crate::util::process::resolve_program;

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR_NAME: &str = ".ccline";

/// Toolchain configuration file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Toolchain settings
    pub toolchain: ToolchainSettings,
}

/// Toolchain settings for compilation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Compiler family (msvc, gcc, clang, apple-clang)
    pub platform: Option<ToolchainPlatform>,

    /// Path to the compiler (e.g., /usr/bin/clang)
    pub compiler: Option<PathBuf>,

    /// When to pass arguments through an options file
    pub options_file: Option<OptionsFileMode>,

    /// Keep the source file on the command line when spilling
    pub keep_source_on_command_line: Option<bool>,

    /// Directory for options files
    pub scratch_dir: Option<PathBuf>,

    /// Directory for object files whose unit does not name one
    pub object_dir: Option<PathBuf>,

    /// Object file extension override
    pub object_extension: Option<String>,

    /// Maximum number of concurrent compiler processes
    pub jobs: Option<usize>,

    /// Arguments added to every compilation, before the unit's own
    pub args: Vec<String>,

    /// Extra environment variables for the compiler process
    pub env: BTreeMap<String, String>,
}

impl ToolchainConfig {
    /// Load toolchain configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    /// Load toolchain configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to load toolchain config from {}: {:#}",
                    path.display(),
                    e
                );
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ToolchainConfig) {
        let ours = &mut self.toolchain;
        let theirs = other.toolchain;

        if theirs.platform.is_some() {
            ours.platform = theirs.platform;
        }
        if theirs.compiler.is_some() {
            ours.compiler = theirs.compiler;
        }
        if theirs.options_file.is_some() {
            ours.options_file = theirs.options_file;
        }
        if theirs.keep_source_on_command_line.is_some() {
            ours.keep_source_on_command_line = theirs.keep_source_on_command_line;
        }
        if theirs.scratch_dir.is_some() {
            ours.scratch_dir = theirs.scratch_dir;
        }
        if theirs.object_dir.is_some() {
            ours.object_dir = theirs.object_dir;
        }
        if theirs.object_extension.is_some() {
            ours.object_extension = theirs.object_extension;
        }
        if theirs.jobs.is_some() {
            ours.jobs = theirs.jobs;
        }
        if !theirs.args.is_empty() {
            ours.args = theirs.args;
        }
        // Environment tables combine key by key
        ours.env.extend(theirs.env);
    }
}

impl ToolchainSettings {
    /// Configured platform, or the host's native one.
    pub fn platform(&self) -> ToolchainPlatform {
        self.platform.unwrap_or_else(ToolchainPlatform::host_default)
    }

    /// Configured compiler, or the platform's default program.
    pub fn compiler(&self) -> PathBuf {
        self.compiler
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.platform().default_compiler()))
    }

    /// Configured options-file mode, or the platform default.
    ///
    /// MSVC always uses an options file; GCC-compatible compilers only when
    /// the command line gets long.
    pub fn options_file(&self) -> OptionsFileMode {
        self.options_file.unwrap_or(match self.platform() {
            ToolchainPlatform::Msvc => OptionsFileMode::Always,
            _ => OptionsFileMode::Threshold(DEFAULT_COMMAND_LINE_LIMIT),
        })
    }

    /// Scratch directory, resolved against `project_root`.
    pub fn scratch_dir(&self, project_root: &Path) -> PathBuf {
        match &self.scratch_dir {
            Some(dir) => absolutize(project_root, dir),
            None => project_root.join(CONFIG_DIR_NAME).join("tmp"),
        }
    }

    /// Object directory, resolved against `project_root`.
    pub fn object_dir(&self, project_root: &Path) -> PathBuf {
        match &self.object_dir {
            Some(dir) => absolutize(project_root, dir),
            None => project_root.join("build").join("obj"),
        }
    }

    /// Object file naming scheme for this toolchain.
    pub fn object_naming(&self, project_root: &Path) -> ObjectFileNaming {
        let extension = self
            .object_extension
            .clone()
            .unwrap_or_else(|| toolchain_for(self.platform()).object_extension().to_string());
        ObjectFileNaming::new(self.object_dir(project_root), extension)
    }

    /// Invocation settings for the compiler driver.
    ///
    /// A relative `compiler` path is taken relative to `project_root`.
    pub fn compiler_settings(&self, project_root: &Path) -> CompilerSettings {
        let mut settings = CompilerSettings::new(
            resolve_program(&self.compiler(), project_root),
            self.scratch_dir(project_root),
        )
        .options_file(self.options_file())
        .keep_source_on_command_line(self.keep_source_on_command_line.unwrap_or(false));

        for (key, value) in &self.env {
            settings = settings.env(key, value);
        }
        settings
    }

    /// Transform prepending the configured `args` to every spec's own.
    pub fn spec_transform(&self) -> Option<SpecTransform> {
        if self.args.is_empty() {
            return None;
        }
        let extra = self.args.clone();
        Some(Arc::new(move |spec: &CompileSpec| {
            let mut spec = spec.clone();
            spec.args = extra.iter().cloned().chain(spec.args).collect();
            spec
        }))
    }
}

/// Load merged toolchain configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.ccline/toolchain.toml)
/// 2. Global config (~/.ccline/toolchain.toml)
/// 3. Defaults
pub fn load_toolchain_config(global_path: Option<&Path>, project_path: &Path) -> ToolchainConfig {
    let mut config = ToolchainConfig::default();

    if let Some(global_path) = global_path {
        config.merge(ToolchainConfig::load_or_default(global_path));
    }

    // Project config overrides global
    config.merge(ToolchainConfig::load_or_default(project_path));

    config
}

/// Get the global config directory (~/.ccline).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global toolchain config path (~/.ccline/toolchain.toml).
pub fn global_toolchain_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("toolchain.toml"))
}

/// Get the project toolchain config path (.ccline/toolchain.toml).
pub fn project_toolchain_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join("toolchain.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let config: ToolchainConfig = toml::from_str(
            r#"
            [toolchain]
            platform = "msvc"
            compiler = "C:/VC/bin/cl.exe"
            options_file = { threshold = 8000 }
            args = ["/W4"]
            jobs = 4

            [toolchain.env]
            INCLUDE = "C:/VC/include"
            "#,
        )
        .unwrap();

        let tc = &config.toolchain;
        assert_eq!(tc.platform(), ToolchainPlatform::Msvc);
        assert_eq!(tc.compiler(), PathBuf::from("C:/VC/bin/cl.exe"));
        assert_eq!(tc.options_file(), OptionsFileMode::Threshold(8000));
        assert_eq!(tc.args, vec!["/W4"]);
        assert_eq!(tc.jobs, Some(4));
        assert_eq!(tc.env.get("INCLUDE").map(String::as_str), Some("C:/VC/include"));
    }

    #[test]
    fn test_platform_defaults() {
        let msvc = ToolchainSettings {
            platform: Some(ToolchainPlatform::Msvc),
            ..Default::default()
        };
        assert_eq!(msvc.options_file(), OptionsFileMode::Always);
        assert_eq!(msvc.compiler(), PathBuf::from("cl.exe"));

        let gcc = ToolchainSettings {
            platform: Some(ToolchainPlatform::Gcc),
            ..Default::default()
        };
        assert_eq!(
            gcc.options_file(),
            OptionsFileMode::Threshold(DEFAULT_COMMAND_LINE_LIMIT)
        );

        let root = Path::new("/proj");
        assert_eq!(gcc.scratch_dir(root), Path::new("/proj/.ccline/tmp"));
        assert_eq!(gcc.object_dir(root), Path::new("/proj/build/obj"));
    }

    #[test]
    fn test_merge_precedence() {
        let mut global: ToolchainConfig = toml::from_str(
            r#"
            [toolchain]
            platform = "gcc"
            args = ["-Wall"]
            env = { A = "1", B = "1" }
            "#,
        )
        .unwrap();
        let project: ToolchainConfig = toml::from_str(
            r#"
            [toolchain]
            platform = "clang"
            env = { B = "2" }
            "#,
        )
        .unwrap();

        global.merge(project);
        let tc = &global.toolchain;
        assert_eq!(tc.platform(), ToolchainPlatform::Clang);
        assert_eq!(tc.args, vec!["-Wall"]);
        assert_eq!(tc.env.get("A").map(String::as_str), Some("1"));
        assert_eq!(tc.env.get("B").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = project_toolchain_config_path(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[toolchain]\nplatform = \"msvc\"\noptions_file = \"never\"\n").unwrap();

        let loaded = ToolchainConfig::load(&path).unwrap();
        assert_eq!(loaded.toolchain.platform, Some(ToolchainPlatform::Msvc));
        assert_eq!(loaded.toolchain.options_file, Some(OptionsFileMode::Never));

        std::fs::write(&path, "[toolchain]\nplatform = \"icc\"\n").unwrap();
        let err = ToolchainConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse toolchain config"));
    }

    #[test]
    fn test_load_toolchain_config_layers() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");
        std::fs::write(&global, "[toolchain]\nplatform = \"gcc\"\njobs = 2\n").unwrap();
        std::fs::write(&project, "[toolchain]\njobs = 8\n").unwrap();

        let config = load_toolchain_config(Some(&global), &project);
        assert_eq!(config.toolchain.platform(), ToolchainPlatform::Gcc);
        assert_eq!(config.toolchain.jobs, Some(8));

        // Broken files fall back to defaults instead of failing
        std::fs::write(&project, "[toolchain\n").unwrap();
        let config = load_toolchain_config(None, &project);
        assert!(config.toolchain.platform.is_none());
    }

    #[test]
    fn test_spec_transform_prepends_args() {
        let settings = ToolchainSettings {
            args: vec!["-Wall".to_string()],
            ..Default::default()
        };
        let transform = settings.spec_transform().unwrap();
        let spec = CompileSpec::new("/b/a.c", "/b/a.o", "/b").arg("-O0");
        assert_eq!(transform(&spec).args, vec!["-Wall", "-O0"]);

        assert!(ToolchainSettings::default().spec_transform().is_none());
    }

    #[test]
    fn test_compiler_settings() {
        let settings = ToolchainSettings {
            platform: Some(ToolchainPlatform::Msvc),
            compiler: Some(PathBuf::from("tools/cl.exe")),
            keep_source_on_command_line: Some(true),
            env: [("INCLUDE".to_string(), "inc".to_string())].into_iter().collect(),
            ..Default::default()
        }
        .compiler_settings(Path::new("/proj"));

        assert_eq!(settings.program, PathBuf::from("/proj/tools/cl.exe"));
        assert_eq!(settings.options_file, OptionsFileMode::Always);
        assert!(settings.keep_source_on_command_line);
        assert_eq!(settings.scratch_dir, Path::new("/proj/.ccline/tmp"));
        assert_eq!(settings.env, vec![("INCLUDE".to_string(), "inc".to_string())]);
    }
}
