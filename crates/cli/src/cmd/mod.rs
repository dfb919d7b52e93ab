//! Subcommand implementations.

mod build;
mod clean;
mod list;
mod sync;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use list::cmd_list;
pub use sync::cmd_sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use yabt_lib::workspace::Workspace;

/// The build directory for `workspace`, resolving a relative override against
/// the current directory.
fn resolve_build_dir(workspace: &Workspace, overridden: Option<&Path>) -> Result<PathBuf> {
  let overridden = overridden
    .map(std::path::absolute)
    .transpose()
    .context("Failed to resolve build directory")?;
  Ok(workspace.build_dir(overridden.as_deref()))
}
