//! Dependency modules and their version-control backends.
//!
//! A module is a directory with a `MODULE.lua` manifest that is checked out
//! from a VCS repository. The [`Module`] trait exposes the few VCS operations
//! the resolver needs; [`GitModule`] implements them by shelling out to
//! `git`. How modules are located and fetched is abstracted behind
//! [`ModuleSource`] so resolution logic can be exercised without a VCS.

mod git;
pub mod manifest;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::{RULES_DIR_NAME, SRC_DIR_NAME};
use crate::process::ProcessError;

pub use git::GitModule;
pub use manifest::{DependencyDefinition, ModuleFile};

/// Errors raised by module handles and VCS operations.
#[derive(Debug, Error)]
pub enum ModuleError {
  #[error("'{0}' is not a module (no version control checkout found)")]
  NotAModule(PathBuf),

  #[error("cannot determine module type for '{url}': set type = \"git\" or use a .git URL")]
  UnknownModuleType { url: String },

  #[error("failed to fetch '{url}': {stderr}")]
  FetchFailed { url: String, stderr: String },

  #[error("'{command}' failed in '{path}': {reason}")]
  VcsCommandFailed {
    path: PathBuf,
    command: String,
    reason: String,
  },

  #[error(transparent)]
  Process(#[from] ProcessError),
}

/// Supported VCS backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
  Git,
}

impl ModuleKind {
  /// Select a backend from a declared `type` tag, falling back to the URL suffix.
  pub fn detect(kind: &str, url: &str) -> Result<Self, ModuleError> {
    match kind {
      "git" => Ok(ModuleKind::Git),
      "" if url.ends_with(".git") => Ok(ModuleKind::Git),
      _ => Err(ModuleError::UnknownModuleType { url: url.to_string() }),
    }
  }

  /// Whether `dir` holds a checkout for this backend.
  pub fn is_checkout(self, dir: &Path) -> bool {
    match self {
      ModuleKind::Git => dir.join(".git").exists(),
    }
  }
}

/// A dependency's on-disk checkout.
pub trait Module: fmt::Debug {
  /// Logical name: the last component of the checkout path.
  fn name(&self) -> &str;

  /// Absolute path of the checkout.
  fn disk_path(&self) -> &Path;

  /// `<module>/rules`, only when it exists.
  fn rules_dir(&self) -> Option<PathBuf> {
    let dir = self.disk_path().join(RULES_DIR_NAME);
    dir.is_dir().then_some(dir)
  }

  /// `<module>/src`, whether or not it exists.
  fn src_dir(&self) -> PathBuf {
    self.disk_path().join(SRC_DIR_NAME)
  }

  /// Identifier of the currently checked out revision.
  fn head(&self) -> Result<String, ModuleError>;

  /// Update all refs from the remote.
  fn fetch(&self) -> Result<(), ModuleError>;

  /// Whether `ancestor` is reachable from `descendant`.
  fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, ModuleError>;

  /// Move the working tree to `rev`.
  fn checkout(&self, rev: &str) -> Result<(), ModuleError>;
}

/// Locates and fetches modules on disk.
pub trait ModuleSource {
  /// Open an existing checkout.
  fn open(&self, dir: &Path) -> Result<Box<dyn Module>, ModuleError>;

  /// Open the checkout at `dir`, cloning `dep` there first if it is missing.
  fn open_or_fetch(&self, dir: &Path, dep: &DependencyDefinition) -> Result<Box<dyn Module>, ModuleError>;
}

/// [`ModuleSource`] backed by the real VCS tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct VcsModuleSource;

impl ModuleSource for VcsModuleSource {
  fn open(&self, dir: &Path) -> Result<Box<dyn Module>, ModuleError> {
    open_module(dir)
  }

  fn open_or_fetch(&self, dir: &Path, dep: &DependencyDefinition) -> Result<Box<dyn Module>, ModuleError> {
    open_or_fetch_module(dir, dep)
  }
}

/// Open the checkout at `dir`.
pub fn open_module(dir: &Path) -> Result<Box<dyn Module>, ModuleError> {
  if ModuleKind::Git.is_checkout(dir) {
    return Ok(Box::new(GitModule::open(dir)));
  }
  Err(ModuleError::NotAModule(dir.to_path_buf()))
}

/// Open the checkout at `dir`, fetching it from `dep.url` when absent.
pub fn open_or_fetch_module(dir: &Path, dep: &DependencyDefinition) -> Result<Box<dyn Module>, ModuleError> {
  if ModuleKind::Git.is_checkout(dir) {
    return open_module(dir);
  }

  match ModuleKind::detect(&dep.kind, &dep.url)? {
    ModuleKind::Git => Ok(Box::new(GitModule::clone_repository(&dep.url, dir)?)),
  }
}
