//! `yabt build`: generate `build.ninja` and run Ninja on it.

use std::path::Path;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;
use yabt_lib::build::{emit, generate_graph, run_ninja};
use yabt_lib::workspace::Workspace;

use super::resolve_build_dir;
use crate::output::{format_duration, print_info, print_success, print_warning};

fn default_threads() -> usize {
  thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

pub fn cmd_build(threads: Option<usize>, build_dir: Option<&Path>) -> Result<()> {
  let start = Instant::now();

  let workspace = Workspace::discover()?;
  let build_dir = resolve_build_dir(&workspace, build_dir)?;
  debug!(root = %workspace.root().display(), build_dir = %build_dir.display(), "building workspace");

  let graph = generate_graph(&workspace, &build_dir).context("Failed to generate build graph")?;
  if graph.is_empty() {
    print_warning("No build steps were defined");
  }
  let ninja_file = emit(&graph, &build_dir)?;
  print_info(&format!("Wrote {}", ninja_file.display()));

  let threads = threads.filter(|&n| n > 0).unwrap_or_else(default_threads);
  run_ninja(&build_dir, threads)?;

  print_success(&format!("Build finished in {}", format_duration(start.elapsed())));
  Ok(())
}
