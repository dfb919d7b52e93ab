mod cmd;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};

use crate::logging::{LogLevel, init_tracing};
use crate::output::{OutputFormat, print_error};

/// yabt - yet another build tool
///
/// Resolves pinned module dependencies, evaluates Lua build scripts and
/// drives Ninja.
#[derive(Parser)]
#[command(name = "yabt")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose (debug) logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Set the log level explicitly (overrides --verbose)
  #[arg(long, global = true, value_enum)]
  log_level: Option<LogLevel>,

  /// Disable colored output
  #[arg(long, global = true)]
  no_color: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the workspace with Ninja
  Build {
    /// Number of parallel build jobs (default: available parallelism)
    #[arg(long)]
    threads: Option<usize>,

    /// Output directory (default: <workspace>/build)
    #[arg(long)]
    build_dir: Option<PathBuf>,
  },

  /// Fetch, pin and check out every dependency module
  Sync {
    /// Refuse dependencies that do not declare a hash
    #[arg(long)]
    strict: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Remove build outputs
  Clean {
    /// Also remove dependency checkouts
    #[arg(long)]
    deps: bool,

    /// Output directory (default: <workspace>/build)
    #[arg(long)]
    build_dir: Option<PathBuf>,
  },

  /// List build targets, optionally filtered by regular expressions
  List {
    /// Print targets as a JSON array
    #[arg(long)]
    json: bool,

    /// Patterns a target must fully match
    patterns: Vec<String>,
  },
}

impl Commands {
  fn name(&self) -> &'static str {
    match self {
      Commands::Build { .. } => "build",
      Commands::Sync { .. } => "sync",
      Commands::Clean { .. } => "clean",
      Commands::List { .. } => "list",
    }
  }
}

fn print_subcommand_help(name: &str) {
  let mut command = Cli::command();
  if let Some(subcommand) = command.find_subcommand_mut(name) {
    eprintln!();
    eprintln!("{}", subcommand.render_help());
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  if cli.no_color {
    owo_colors::set_override(false);
  }
  init_tracing(LogLevel::select(cli.log_level, cli.verbose), !cli.no_color);

  let name = cli.command.name();
  let result = match cli.command {
    Commands::Build { threads, build_dir } => cmd::cmd_build(threads, build_dir.as_deref()),
    Commands::Sync { strict, format } => cmd::cmd_sync(strict, format),
    Commands::Clean { deps, build_dir } => cmd::cmd_clean(deps, build_dir.as_deref()),
    Commands::List { json, patterns } => cmd::cmd_list(&patterns, json),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      print_subcommand_help(name);
      ExitCode::FAILURE
    }
  }
}
