//! Test doubles for the compiler driver's collaborators.
//!
//! [`RecordingWorker`] stands in for a real compiler process and
//! [`RecordingListener`] captures build operation lifecycles, so driver
//! tests run without any toolchain installed.

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use crate::builder::errors::CompileError;
use crate::builder::invocation::{CommandLineToolInvocation, InvocationOutput, InvocationWorker};
use crate::builder::operation::{BuildOperationListener, OperationDescriptor, OperationOutcome};

/// What a [`RecordingWorker`] answers with.
#[derive(Debug, Clone)]
enum Response {
    Output(InvocationOutput),
    SpawnError,
}

/// Invocation worker that records command lines instead of running them.
#[derive(Debug)]
pub struct RecordingWorker {
    response: Response,
    invocations: Mutex<Vec<CommandLineToolInvocation>>,
}

impl RecordingWorker {
    /// Every invocation exits 0.
    pub fn succeeding() -> Self {
        Self::with_response(Response::Output(InvocationOutput::success("")))
    }

    /// Every invocation exits with `code` and prints `stderr`.
    pub fn failing(code: i32, stderr: &str) -> Self {
        Self::with_response(Response::Output(InvocationOutput::failure(code, stderr)))
    }

    /// Every invocation fails to start.
    pub fn unspawnable() -> Self {
        Self::with_response(Response::SpawnError)
    }

    fn with_response(response: Response) -> Self {
        RecordingWorker {
            response,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Invocations seen so far, in arrival order.
    pub fn invocations(&self) -> Vec<CommandLineToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl InvocationWorker for RecordingWorker {
    fn invoke(
        &self,
        invocation: &CommandLineToolInvocation,
    ) -> Result<InvocationOutput, CompileError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        match &self.response {
            Response::Output(output) => Ok(output.clone()),
            Response::SpawnError => Err(CompileError::Spawn {
                program: invocation.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "program not found"),
            }),
        }
    }
}

/// Listener that remembers every lifecycle event.
#[derive(Debug, Default)]
pub struct RecordingListener {
    started: Mutex<Vec<OperationDescriptor>>,
    finished: Mutex<Vec<(OperationDescriptor, OperationOutcome)>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        RecordingListener::default()
    }

    /// Names of started operations.
    pub fn started_names(&self) -> Vec<String> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|op| op.name.clone())
            .collect()
    }

    /// Ids of started operations.
    pub fn started_ids(&self) -> Vec<u64> {
        self.started.lock().unwrap().iter().map(|op| op.id).collect()
    }

    /// Outcomes of finished operations.
    pub fn finished_outcomes(&self) -> Vec<OperationOutcome> {
        self.finished
            .lock()
            .unwrap()
            .iter()
            .map(|(_, outcome)| outcome.clone())
            .collect()
    }
}

impl BuildOperationListener for RecordingListener {
    fn started(&self, op: &OperationDescriptor) {
        self.started.lock().unwrap().push(op.clone());
    }

    fn finished(&self, op: &OperationDescriptor, outcome: &OperationOutcome, _elapsed: Duration) {
        self.finished
            .lock()
            .unwrap()
            .push((op.clone(), outcome.clone()));
    }
}
