//! Command execution primitives with consistent error handling.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::error::{Error, Result};

/// Run a program with input piped to stdin, capturing stdout and stderr.
///
/// Used for helper binaries speaking a request/reply protocol over their
/// standard streams. A failed write to stdin is tolerated: a helper that
/// exits before reading its request reports through its exit status.
pub fn run_with_stdin(program: &Path, input: &str, context: &str) -> Result<Output> {
    let mut child = Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            Error::internal_io(
                format!("Failed to run {}: {}", context, e),
                Some(context.to_string()),
            )
        })?;

    if let Some(ref mut stdin) = child.stdin {
        let _ = stdin.write_all(input.as_bytes());
    }

    // wait_with_output closes stdin first, so the helper sees EOF.
    child.wait_with_output().map_err(|e| {
        Error::internal_io(
            format!("Failed to run {}: {}", context, e),
            Some(context.to_string()),
        )
    })
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}
