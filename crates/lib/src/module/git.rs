use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Module, ModuleError};
use crate::process::{self, ExitReason, ProcessOutput};

const GIT: &str = "git";

/// A git checkout driven through the `git` executable.
#[derive(Debug, Clone)]
pub struct GitModule {
  name: String,
  path: PathBuf,
}

impl GitModule {
  /// Wrap an existing checkout without validating it.
  pub fn open(path: &Path) -> Self {
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    GitModule {
      name,
      path: path.to_path_buf(),
    }
  }

  /// Clone `url` into `path`.
  pub fn clone_repository(url: &str, path: &Path) -> Result<Self, ModuleError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| ModuleError::FetchFailed {
        url: url.to_string(),
        stderr: format!("cannot create '{}': {}", parent.display(), e),
      })?;
    }

    info!(url, path = %path.display(), "cloning module");

    let output = process::capture(GIT, [OsStr::new("clone"), OsStr::new(url), path.as_os_str()], None)?;
    if !output.success() {
      return Err(ModuleError::FetchFailed {
        url: url.to_string(),
        stderr: output.stderr.trim().to_string(),
      });
    }

    Ok(Self::open(path))
  }

  fn git(&self, args: &[&str]) -> Result<ProcessOutput, ModuleError> {
    let mut full_args = vec![OsStr::new("-C"), self.path.as_os_str()];
    full_args.extend(args.iter().map(OsStr::new));
    Ok(process::capture(GIT, full_args, None)?)
  }

  fn command_failed(&self, args: &[&str], output: &ProcessOutput) -> ModuleError {
    ModuleError::VcsCommandFailed {
      path: self.path.clone(),
      command: format!("git {}", args.join(" ")),
      reason: output.failure_reason(),
    }
  }

  fn git_checked(&self, args: &[&str]) -> Result<ProcessOutput, ModuleError> {
    let output = self.git(args)?;
    if !output.success() {
      return Err(self.command_failed(args, &output));
    }
    Ok(output)
  }
}

impl Module for GitModule {
  fn name(&self) -> &str {
    &self.name
  }

  fn disk_path(&self) -> &Path {
    &self.path
  }

  fn head(&self) -> Result<String, ModuleError> {
    let output = self.git_checked(&["rev-list", "--max-count=1", "HEAD"])?;
    Ok(output.stdout.trim().to_string())
  }

  fn fetch(&self) -> Result<(), ModuleError> {
    debug!(module = %self.name, "fetching");
    self.git_checked(&["fetch", "--all", "--tags"])?;
    Ok(())
  }

  fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, ModuleError> {
    let args = ["merge-base", "--is-ancestor", ancestor, descendant];
    let output = self.git(&args)?;
    match output.exit {
      ExitReason::Code(0) => Ok(true),
      ExitReason::Code(1) => Ok(false),
      _ => Err(self.command_failed(&args, &output)),
    }
  }

  fn checkout(&self, rev: &str) -> Result<(), ModuleError> {
    info!(module = %self.name, rev, "checking out");
    self.git_checked(&["checkout", "--quiet", rev])?;
    Ok(())
  }
}
