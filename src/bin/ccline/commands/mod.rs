//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use ccline::builder::compiler::NativeCompiler;
use ccline::builder::invocation::ProcessInvocationWorker;
use ccline::builder::lease::WorkerLeases;
use ccline::builder::operation::{BuildOperationExecutor, BuildOperationListener};
use ccline::builder::toolchain::{toolchain_for, ToolchainPlatform};
use ccline::util::config::{
    global_toolchain_config_path, load_toolchain_config, project_toolchain_config_path,
    ToolchainConfig, ToolchainSettings,
};

pub mod args;
pub mod compile;
pub mod options;
pub mod toolchain;

/// State shared by every command: where we run and how the toolchain is set up.
pub struct Session {
    /// Project root (the current directory)
    pub root: PathBuf,
    /// Merged toolchain settings
    pub settings: ToolchainSettings,
    /// Config files that were consulted, in precedence order (lowest first)
    pub config_files: Vec<PathBuf>,
    pub verbose: bool,
}

impl Session {
    /// Load configuration for the current directory.
    ///
    /// An explicit `config` file must exist and parse; the implicit project
    /// and global files are optional.
    pub fn load(
        config: Option<&Path>,
        platform: Option<ToolchainPlatform>,
        verbose: bool,
    ) -> Result<Self> {
        let root = std::env::current_dir().context("failed to determine current directory")?;
        let global_path = global_toolchain_config_path();

        let mut config_files: Vec<PathBuf> = global_path.iter().cloned().collect();
        let mut merged = match config {
            Some(path) => {
                let mut merged = ToolchainConfig::default();
                if let Some(global) = &global_path {
                    merged.merge(ToolchainConfig::load_or_default(global));
                }
                merged.merge(ToolchainConfig::load(path)?);
                config_files.push(path.to_path_buf());
                merged
            }
            None => {
                let project_path = project_toolchain_config_path(&root);
                let merged = load_toolchain_config(global_path.as_deref(), &project_path);
                config_files.push(project_path);
                merged
            }
        };
        config_files.retain(|p| p.is_file());

        if platform.is_some() {
            merged.toolchain.platform = platform;
        }

        tracing::debug!("Using {} toolchain", merged.toolchain.platform());

        Ok(Session {
            root,
            settings: merged.toolchain,
            config_files,
            verbose,
        })
    }

    /// Build a compiler driver reporting to `listener`.
    pub fn native_compiler(
        &self,
        listener: Arc<dyn BuildOperationListener>,
        leases: WorkerLeases,
    ) -> NativeCompiler {
        let compiler = NativeCompiler::new(
            toolchain_for(self.settings.platform()),
            self.settings.compiler_settings(&self.root),
            Arc::new(BuildOperationExecutor::new().with_listener(listener)),
            Arc::new(leases),
            Arc::new(ProcessInvocationWorker),
        );

        match self.settings.spec_transform() {
            Some(transform) => compiler.with_spec_transform(transform),
            None => compiler,
        }
    }
}
