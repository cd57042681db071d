//! Build event types for JSON output.
//!
//! This module defines the JSON schema for machine-readable compile output.
//! These events are emitted when using `--message-format=json`.
//!
//! # Event Types
//!
//! - `compile-started`: A compile operation started
//! - `compile-finished`: A compile operation finished (success or failure)
//! - `compiler-output`: Diagnostics printed by a compiler that still succeeded
//! - `build-finished`: All requested units were processed
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::builder::operation::{BuildOperationListener, OperationDescriptor, OperationOutcome};

/// A build event emitted during compilation.
///
/// Each event is serialized as a single JSON object per line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// A compile operation started.
    #[serde(rename = "compile-started")]
    CompileStarted {
        /// Operation id, unique within one run
        id: u64,
        /// Source file
        source: PathBuf,
    },

    /// A compile operation finished.
    #[serde(rename = "compile-finished")]
    CompileFinished {
        /// Operation id, matching the `compile-started` event
        id: u64,
        /// Source file
        source: PathBuf,
        /// Whether the compile succeeded
        success: bool,
        /// Duration in milliseconds
        duration_ms: u64,
        /// Failure message including compiler diagnostics
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Output (usually warnings) from a successful compile.
    #[serde(rename = "compiler-output")]
    CompilerOutput {
        /// Source file
        source: PathBuf,
        /// Combined compiler stdout and stderr
        output: String,
    },

    /// All units processed.
    #[serde(rename = "build-finished")]
    BuildFinished {
        /// Whether every unit succeeded
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Number of units compiled successfully
        compiled: u64,
        /// Number of units that failed
        failed: u64,
    },
}

impl BuildEvent {
    /// Create a build finished event.
    pub fn finished(compiled: u64, failed: u64, duration_ms: u64) -> Self {
        BuildEvent::BuildFinished {
            success: failed == 0,
            duration_ms,
            compiled,
            failed,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Print this event as one line on stdout.
    pub fn emit(&self) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        // Nothing useful to do if stdout is gone.
        let _ = writeln!(out, "{}", self.to_json());
    }
}

/// Listener printing `compile-*` events as JSON lines on stdout.
#[derive(Debug, Default)]
pub struct JsonEventListener;

impl BuildOperationListener for JsonEventListener {
    fn started(&self, op: &OperationDescriptor) {
        BuildEvent::CompileStarted {
            id: op.id,
            source: op.source.clone(),
        }
        .emit();
    }

    fn finished(&self, op: &OperationDescriptor, outcome: &OperationOutcome, elapsed: Duration) {
        let message = match outcome {
            OperationOutcome::Succeeded => None,
            OperationOutcome::Failed(message) => Some(message.clone()),
        };
        BuildEvent::CompileFinished {
            id: op.id,
            source: op.source.clone(),
            success: outcome.is_success(),
            duration_ms: elapsed.as_millis() as u64,
            message,
        }
        .emit();
    }
}
