//! Tracing subscriber setup.

use std::io;

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log levels accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
  Error,
  Warning,
  Info,
  Debug,
  /// Everything, including per-step trace output
  Verbose,
}

impl From<LogLevel> for Level {
  fn from(level: LogLevel) -> Self {
    match level {
      LogLevel::Error => Level::ERROR,
      LogLevel::Warning => Level::WARN,
      LogLevel::Info => Level::INFO,
      LogLevel::Debug => Level::DEBUG,
      LogLevel::Verbose => Level::TRACE,
    }
  }
}

impl LogLevel {
  /// An explicit level wins, then `--verbose`, else warnings only.
  pub fn select(explicit: Option<LogLevel>, verbose: bool) -> Level {
    match (explicit, verbose) {
      (Some(level), _) => level.into(),
      (None, true) => Level::DEBUG,
      (None, false) => Level::WARN,
    }
  }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_tracing(level: Level, ansi: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .with_ansi(ansi)
    .with_target(false)
    .without_time()
    .init();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn level_selection() {
    assert_eq!(LogLevel::select(None, false), Level::WARN);
    assert_eq!(LogLevel::select(None, true), Level::DEBUG);
    assert_eq!(LogLevel::select(Some(LogLevel::Error), true), Level::ERROR);
    assert_eq!(LogLevel::select(Some(LogLevel::Verbose), false), Level::TRACE);
  }
}
