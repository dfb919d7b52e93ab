//! Workspace discovery and layout.
//!
//! The workspace root is the nearest directory, starting from the current
//! directory and walking upwards, that contains a `MODULE.lua`. Dependency
//! checkouts live under `<root>/DEPS/<name>` and build output under
//! `<root>/build` unless overridden.

mod resolve;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{BUILD_DIR_NAME, DEPS_DIR_NAME, MODULE_FILE_NAME};
use crate::util::path::normalize;

pub use resolve::{DependencyResolver, Pin, PinSet, Resolution, ResolveError, SyncMode, open_workspace};

/// A located workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
  root: PathBuf,
}

impl Workspace {
  /// Use `root` as the workspace root without searching.
  pub fn at(root: &Path) -> Self {
    Workspace {
      root: root.to_path_buf(),
    }
  }

  /// Find the workspace enclosing `start`.
  pub fn find(start: &Path) -> Result<Self, ResolveError> {
    let start = dunce::canonicalize(start).map_err(|_| ResolveError::WorkspaceRootNotFound {
      start: start.to_path_buf(),
    })?;

    for dir in start.ancestors() {
      if dir.join(MODULE_FILE_NAME).is_file() {
        debug!(root = %dir.display(), "found workspace root");
        return Ok(Workspace::at(dir));
      }
    }

    Err(ResolveError::WorkspaceRootNotFound { start })
  }

  /// Find the workspace enclosing the current directory.
  pub fn discover() -> Result<Self, ResolveError> {
    let cwd = std::env::current_dir().map_err(|_| ResolveError::WorkspaceRootNotFound {
      start: PathBuf::from("."),
    })?;
    Self::find(&cwd)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// `<root>/DEPS`.
  pub fn deps_dir(&self) -> PathBuf {
    self.root.join(DEPS_DIR_NAME)
  }

  /// Checkout directory for dependency `name`.
  pub fn dep_dir(&self, name: &str) -> PathBuf {
    self.deps_dir().join(name)
  }

  /// The output directory: `overridden` if given, else `<root>/build`.
  pub fn build_dir(&self, overridden: Option<&Path>) -> PathBuf {
    match overridden {
      Some(dir) if dir.is_absolute() => normalize(dir),
      Some(dir) => normalize(&self.root.join(dir)),
      None => self.root.join(BUILD_DIR_NAME),
    }
  }
}
