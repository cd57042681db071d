//! Compile failure types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single compile unit failed.
///
/// Every variant aborts only the unit it was raised for; none of them are
/// retried by the compiler driver.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The options file could not be created or written.
    #[error("failed to write options file in `{}`", .dir.display())]
    ScratchIo {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compiler process could not be started.
    #[error("failed to start `{}`", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compiler ran and reported failure.
    #[error("compilation failed for `{}` ({})\n{output}", .source_file.display(), describe_exit(.code))]
    InvocationFailed {
        source_file: PathBuf,
        code: Option<i32>,
        /// Captured compiler diagnostics (stdout followed by stderr)
        output: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_failed_message_includes_output() {
        let err = CompileError::InvocationFailed {
            source_file: PathBuf::from("src/main.c"),
            code: Some(2),
            output: "main.c(3): error C2143: syntax error".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("src/main.c"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.ends_with("\nmain.c(3): error C2143: syntax error"));
    }

    #[test]
    fn test_scratch_io_has_source() {
        use std::error::Error as _;

        let err = CompileError::ScratchIo {
            dir: PathBuf::from("/tmp/scratch"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/scratch"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("denied"));
    }

    #[test]
    fn test_signal_exit() {
        let err = CompileError::InvocationFailed {
            source_file: PathBuf::from("a.c"),
            code: None,
            output: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }
}
