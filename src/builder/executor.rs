//! Batch compilation with progress reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::builder::compiler::{CompileOutcome, NativeCompiler};
use crate::builder::errors::CompileError;
use crate::core::spec::CompileSpec;
use crate::util::fs::ensure_dir;

/// Compiles many specs through one [`NativeCompiler`].
///
/// Units run in parallel; a failing unit never stops its siblings.
pub struct CompileExecutor<'a> {
    compiler: &'a NativeCompiler,
    jobs: Option<usize>,
    progress_bar: bool,
}

impl<'a> CompileExecutor<'a> {
    /// Create a new executor.
    pub fn new(compiler: &'a NativeCompiler) -> Self {
        CompileExecutor {
            compiler,
            jobs: None,
            progress_bar: false,
        }
    }

    /// Limit the number of worker threads.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Show a progress bar on stderr.
    pub fn progress_bar(mut self, show: bool) -> Self {
        self.progress_bar = show;
        self
    }

    /// Compile every spec, collecting per-unit results in input order.
    pub fn execute(&self, specs: &[CompileSpec]) -> Result<CompileReport> {
        let start = Instant::now();
        let progress = BuildProgress::new();

        let pb = if self.progress_bar && specs.len() > 1 {
            let pb = ProgressBar::new(specs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .context("invalid progress bar template")?
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(j) = self.jobs {
            pool = pool.num_threads(j);
        }
        let pool = pool.build().context("failed to start compile worker pool")?;

        tracing::info!("Compiling {} file(s)", specs.len());

        let results: Vec<Result<CompileOutcome, CompileError>> = pool.install(|| {
            specs
                .par_iter()
                .map(|spec| {
                    let result = self.compile_one(spec);
                    match &result {
                        Ok(_) => progress.compiled(),
                        Err(_) => progress.failed(),
                    }
                    if let Some(pb) = &pb {
                        pb.set_message(format!(
                            "{} compiled, {} failed",
                            progress.compile_count(),
                            progress.failure_count()
                        ));
                        pb.inc(1);
                    }
                    result
                })
                .collect()
        });

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(CompileReport {
            results,
            elapsed: start.elapsed(),
        })
    }

    fn compile_one(&self, spec: &CompileSpec) -> Result<CompileOutcome, CompileError> {
        if let Some(parent) = spec.output.parent() {
            if let Err(e) = ensure_dir(parent) {
                // Let the compiler report the missing directory itself.
                tracing::warn!("{:#}", e);
            }
        }
        self.compiler.compile(spec)
    }
}

/// Results of a batch compile.
#[derive(Debug)]
pub struct CompileReport {
    /// Per-unit results, in input order
    pub results: Vec<Result<CompileOutcome, CompileError>>,
    /// Wall-clock time for the whole batch
    pub elapsed: Duration,
}

impl CompileReport {
    /// Number of units that compiled.
    pub fn compiled(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    /// Units that failed.
    pub fn failures(&self) -> impl Iterator<Item = &CompileError> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    /// Turn the report into an error naming the first failure, if any.
    ///
    /// The first failure stays the error's source, so `{:#}` shows its
    /// whole cause chain.
    pub fn into_result(self) -> Result<Vec<CompileOutcome>> {
        let total = self.results.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for result in self.results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => failures.push(e),
            }
        }

        let failed = failures.len();
        match failures.into_iter().next() {
            Some(first) => Err(anyhow::Error::new(first)
                .context(format!("{} of {} unit(s) failed to compile", failed, total))),
            None => Ok(outcomes),
        }
    }
}

/// Progress counters shared across compile threads.
#[derive(Clone, Default)]
pub struct BuildProgress {
    compiled: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
}

impl BuildProgress {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed compilation.
    pub fn compiled(&self) {
        self.compiled.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a failed compilation.
    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Get current compilation count.
    pub fn compile_count(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }

    /// Get current failure count.
    pub fn failure_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::compiler::CompilerSettings;
    use crate::builder::lease::WorkerLeases;
    use crate::builder::operation::BuildOperationExecutor;
    use crate::builder::toolchain::{toolchain_for, ToolchainPlatform};
    use crate::test_support::{RecordingListener, RecordingWorker};
    use tempfile::TempDir;

    fn compiler(tmp: &TempDir, worker: RecordingWorker, listener: Arc<RecordingListener>) -> NativeCompiler {
        NativeCompiler::new(
            toolchain_for(ToolchainPlatform::Gcc),
            CompilerSettings::new("gcc", tmp.path().join("scratch")),
            Arc::new(BuildOperationExecutor::new().with_listener(listener)),
            Arc::new(WorkerLeases::new(2)),
            Arc::new(worker),
        )
    }

    fn specs(tmp: &TempDir, n: usize) -> Vec<CompileSpec> {
        (0..n)
            .map(|i| {
                CompileSpec::new(
                    tmp.path().join(format!("src/u{}.c", i)),
                    tmp.path().join(format!("obj/u{}.o", i)),
                    tmp.path(),
                )
            })
            .collect()
    }

    #[test]
    fn test_build_progress() {
        let progress = BuildProgress::new();
        progress.compiled();
        progress.failed();
        progress.compiled();
        assert_eq!(progress.compile_count(), 2);
        assert_eq!(progress.failure_count(), 1);
    }

    #[test]
    fn test_build_progress_thread_safe() {
        let progress = BuildProgress::new();
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let p = progress.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        p.compiled();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(progress.compile_count(), 100);
    }

    #[test]
    fn test_execute_all_units() {
        let tmp = TempDir::new().unwrap();
        let listener = Arc::new(RecordingListener::new());
        let compiler = compiler(&tmp, RecordingWorker::succeeding(), listener.clone());

        let report = CompileExecutor::new(&compiler)
            .jobs(Some(4))
            .execute(&specs(&tmp, 10))
            .unwrap();

        assert_eq!(report.failures().count(), 0);
        assert_eq!(report.compiled(), 10);
        assert_eq!(listener.finished_outcomes().len(), 10);
        // Object directories are prepared for the compiler
        assert!(tmp.path().join("obj").is_dir());

        let outcomes = report.into_result().unwrap();
        assert_eq!(outcomes[3].source, tmp.path().join("src/u3.c"));
    }

    #[test]
    fn test_execute_failures_do_not_stop_siblings() {
        let tmp = TempDir::new().unwrap();
        let listener = Arc::new(RecordingListener::new());
        let compiler = compiler(&tmp, RecordingWorker::failing(1, "error: nope"), listener.clone());

        let report = CompileExecutor::new(&compiler)
            .execute(&specs(&tmp, 4))
            .unwrap();

        assert_eq!(report.compiled(), 0);
        assert_eq!(report.failures().count(), 4);
        assert_eq!(listener.finished_outcomes().len(), 4);

        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "4 of 4 unit(s) failed to compile");
        let chain = format!("{:#}", err);
        assert!(chain.contains("compilation failed for"));
        assert!(chain.contains("error: nope"));
    }

    #[test]
    fn test_into_result_keeps_spawn_cause() {
        let tmp = TempDir::new().unwrap();
        let compiler = NativeCompiler::new(
            toolchain_for(ToolchainPlatform::Gcc),
            CompilerSettings::new("missing-cc", tmp.path().join("scratch")),
            Arc::new(BuildOperationExecutor::new()),
            Arc::new(WorkerLeases::new(1)),
            Arc::new(RecordingWorker::unspawnable()),
        );

        let report = CompileExecutor::new(&compiler).execute(&specs(&tmp, 2)).unwrap();
        let chain = format!("{:#}", report.into_result().unwrap_err());
        assert!(chain.starts_with("2 of 2 unit(s) failed to compile: failed to start `missing-cc`"));
        assert!(chain.ends_with("program not found"));
    }
}
