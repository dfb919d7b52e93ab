//! `yabt clean`: remove build outputs and, optionally, dependency checkouts.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;
use yabt_lib::workspace::Workspace;

use super::resolve_build_dir;
use crate::output::{print_info, print_success};

fn remove_dir(dir: &Path) -> Result<bool> {
  if !dir.exists() {
    debug!(dir = %dir.display(), "nothing to remove");
    return Ok(false);
  }
  fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
  Ok(true)
}

pub fn cmd_clean(deps: bool, build_dir: Option<&Path>) -> Result<()> {
  let workspace = Workspace::discover()?;
  let build_dir = resolve_build_dir(&workspace, build_dir)?;

  if workspace.root().starts_with(&build_dir) {
    bail!(
      "Refusing to remove {}: it contains the workspace root",
      build_dir.display()
    );
  }

  let mut removed = Vec::new();
  if remove_dir(&build_dir)? {
    removed.push(build_dir);
  }
  if deps {
    let deps_dir = workspace.deps_dir();
    if remove_dir(&deps_dir)? {
      removed.push(deps_dir);
    }
  }

  if removed.is_empty() {
    print_info("Nothing to clean");
    return Ok(());
  }
  for dir in &removed {
    print_success(&format!("Removed {}", dir.display()));
  }
  Ok(())
}
