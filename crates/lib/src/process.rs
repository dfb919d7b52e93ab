//! Blocking subprocess execution.
//!
//! Every external tool yabt drives (git during `sync`, ninja during `build`)
//! goes through this module. Outcomes are classified into a normal exit with
//! a code or termination by a signal, so callers can interpret tool-specific
//! exit code conventions themselves.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, trace};

/// How a child process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
  /// The process exited normally with the given code.
  Code(i32),
  /// The process was terminated by an unhandled signal.
  Signal(i32),
}

impl ExitReason {
  fn from_status(status: ExitStatus) -> Self {
    if let Some(code) = status.code() {
      return ExitReason::Code(code);
    }

    #[cfg(unix)]
    {
      use std::os::unix::process::ExitStatusExt;
      if let Some(signal) = status.signal() {
        return ExitReason::Signal(signal);
      }
    }

    ExitReason::Code(-1)
  }

  /// Whether the process exited normally with code 0.
  pub fn success(self) -> bool {
    self == ExitReason::Code(0)
  }
}

impl fmt::Display for ExitReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExitReason::Code(code) => write!(f, "exited with code {}", code),
      ExitReason::Signal(signal) => write!(f, "terminated by signal {}", signal),
    }
  }
}

/// Captured output of a finished child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
  pub stdout: String,
  pub stderr: String,
  pub exit: ExitReason,
}

impl ProcessOutput {
  pub fn success(&self) -> bool {
    self.exit.success()
  }

  /// Describe a failed run: the exit reason followed by captured stderr.
  pub fn failure_reason(&self) -> String {
    let stderr = self.stderr.trim();
    if stderr.is_empty() {
      self.exit.to_string()
    } else {
      format!("{}\nstderr: {}", self.exit, stderr)
    }
  }
}

/// Errors that can occur when starting a child process.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The program could not be started at all.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },
}

/// Run a program to completion, capturing stdout and stderr.
///
/// A non-zero exit is not an error here; inspect [`ProcessOutput::exit`].
pub fn capture<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<ProcessOutput, ProcessError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  let mut command = Command::new(program);
  command.args(args).stdin(Stdio::null());
  if let Some(dir) = cwd {
    command.current_dir(dir);
  }

  trace!(?command, "spawning process");

  let output = command.output().map_err(|e| ProcessError::Spawn {
    program: program.to_string(),
    source: e,
  })?;

  let result = ProcessOutput {
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    exit: ExitReason::from_status(output.status),
  };

  if !result.success() {
    debug!(program, exit = %result.exit, stderr = %result.stderr.trim(), "process failed");
  }

  Ok(result)
}

/// Run a program to completion with stdio inherited from this process.
pub fn run_inherited<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<ExitReason, ProcessError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  let mut command = Command::new(program);
  command.args(args);
  if let Some(dir) = cwd {
    command.current_dir(dir);
  }

  debug!(?command, "running process");

  let status = command.status().map_err(|e| ProcessError::Spawn {
    program: program.to_string(),
    source: e,
  })?;

  Ok(ExitReason::from_status(status))
}
