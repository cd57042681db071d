//! Build operations.
//!
//! Every compile invocation runs inside exactly one build operation. The
//! operation is a scope guard: it is reported as started when created and as
//! finished when dropped, on success and failure paths alike. Listeners
//! observe the lifecycle (logging, JSON events, test recorders).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identity of a running build operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Unique per executor
    pub id: u64,
    /// Display name (e.g. "Compile main.c")
    pub name: String,
    /// Source file being compiled
    pub source: PathBuf,
}

/// How a build operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Succeeded,
    Failed(String),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded)
    }
}

/// Observer of build operation lifecycles.
pub trait BuildOperationListener: Send + Sync {
    /// Called when an operation starts.
    fn started(&self, op: &OperationDescriptor);

    /// Called exactly once when an operation finishes.
    fn finished(&self, op: &OperationDescriptor, outcome: &OperationOutcome, elapsed: Duration);
}

/// Opens build operations and fans their lifecycle out to listeners.
#[derive(Default)]
pub struct BuildOperationExecutor {
    next_id: AtomicU64,
    listeners: Vec<Arc<dyn BuildOperationListener>>,
}

impl BuildOperationExecutor {
    /// Create an executor with no listeners.
    pub fn new() -> Self {
        BuildOperationExecutor::default()
    }

    /// Add a listener.
    pub fn with_listener(mut self, listener: Arc<dyn BuildOperationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Start an operation. It finishes when the returned scope is dropped.
    pub fn start(&self, name: impl Into<String>, source: &Path) -> OperationScope<'_> {
        let descriptor = OperationDescriptor {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            name: name.into(),
            source: source.to_path_buf(),
        };

        let span = tracing::info_span!(
            "operation",
            id = descriptor.id,
            name = %descriptor.name
        )
        .entered();

        for listener in &self.listeners {
            listener.started(&descriptor);
        }

        OperationScope {
            executor: self,
            descriptor,
            started: Instant::now(),
            outcome: None,
            _span: span,
        }
    }
}

/// A running build operation.
///
/// Dropping the scope without calling [`succeed`](Self::succeed) or
/// [`fail`](Self::fail) reports a failure.
pub struct OperationScope<'a> {
    executor: &'a BuildOperationExecutor,
    descriptor: OperationDescriptor,
    started: Instant,
    outcome: Option<OperationOutcome>,
    _span: tracing::span::EnteredSpan,
}

impl OperationScope<'_> {
    /// Finish the operation successfully.
    pub fn succeed(mut self) {
        self.outcome = Some(OperationOutcome::Succeeded);
    }

    /// Finish the operation with a failure message.
    pub fn fail(mut self, message: impl Into<String>) {
        self.outcome = Some(OperationOutcome::Failed(message.into()));
    }
}

impl Drop for OperationScope<'_> {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| OperationOutcome::Failed("operation did not complete".to_string()));
        let elapsed = self.started.elapsed();

        for listener in &self.executor.listeners {
            listener.finished(&self.descriptor, &outcome, elapsed);
        }
    }
}

/// Listener that reports operations through `tracing`.
#[derive(Debug, Default)]
pub struct TracingListener;

impl BuildOperationListener for TracingListener {
    fn started(&self, op: &OperationDescriptor) {
        tracing::debug!("{} started", op.name);
    }

    fn finished(&self, op: &OperationDescriptor, outcome: &OperationOutcome, elapsed: Duration) {
        match outcome {
            OperationOutcome::Succeeded => {
                tracing::debug!("{} finished in {:.2}s", op.name, elapsed.as_secs_f64())
            }
            OperationOutcome::Failed(message) => {
                tracing::debug!("{} failed: {}", op.name, message)
            }
        }
    }
}
