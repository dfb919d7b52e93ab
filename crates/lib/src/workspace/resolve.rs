//! Dependency resolution.
//!
//! Resolution is a breadth-first walk over module manifests, starting at the
//! workspace root. Every dependency is checked out once under
//! `<root>/DEPS/<name>` and pinned to a commit:
//!
//! - a declared `hash` must be an ancestor of the declared `version`, and is
//!   what gets checked out
//! - without a `hash`, the `version` ref is checked out (refused in strict mode)
//! - a later declaration of an already pinned name must agree with the pin
//!
//! [`open_workspace`] performs the same walk without touching any checkout.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::Workspace;
use crate::consts::MODULE_FILE_NAME;
use crate::module::manifest::{ManifestError, load_module_file};
use crate::module::{DependencyDefinition, Module, ModuleError, ModuleSource, VcsModuleSource};

/// Errors that can occur while resolving a workspace.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("could not find workspace root from '{start}': no MODULE.lua in any parent directory")]
  WorkspaceRootNotFound { start: PathBuf },

  #[error("dependency '{name}' of '{module}' is not pinned; refusing to sync in strict mode")]
  UnpinnedDependencyInStrictMode { name: String, module: String },

  #[error("dependency '{name}' requires '{actual}', but it has been pinned to '{expected}'")]
  PinConflict {
    name: String,
    expected: String,
    actual: String,
  },

  #[error("dependency '{name}' has hash '{hash}' that is not an ancestor of its version '{version}'")]
  UnreachablePin {
    name: String,
    hash: String,
    version: String,
  },

  #[error("dependency '{name}'")]
  Dependency {
    name: String,
    #[source]
    source: ModuleError,
  },

  #[error(transparent)]
  Module(#[from] ModuleError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

/// Whether unpinned dependencies are acceptable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
  #[default]
  Normal,
  /// Every dependency must declare a `hash`.
  Strict,
}

/// The commit a dependency was resolved to, with the declaration that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pin {
  pub commit: String,
  pub url: String,
  pub version: String,
  /// Declared hash; empty when the dependency followed `version`.
  pub hash: String,
}

impl Pin {
  fn new(commit: String, dep: &DependencyDefinition) -> Self {
    Pin {
      commit,
      url: dep.url.clone(),
      version: dep.version.clone(),
      hash: dep.hash.clone(),
    }
  }

  /// Whether a later declaration `dep` resolves to this pin.
  ///
  /// Only a declared hash identifying the pinned commit matches; an
  /// unpinned redeclaration never does.
  pub fn accepts(&self, dep: &DependencyDefinition) -> bool {
    dep.is_pinned() && self.commit.starts_with(&dep.hash)
  }
}

/// Dependency name to resolved pin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PinSet(BTreeMap<String, Pin>);

impl PinSet {
  pub fn get(&self, name: &str) -> Option<&Pin> {
    self.0.get(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Pin)> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  fn insert(&mut self, name: String, pin: Pin) {
    self.0.insert(name, pin);
  }
}

/// Result of a full resolution.
#[derive(Debug)]
pub struct Resolution {
  /// Root module first, then dependencies in discovery order.
  pub modules: Vec<Box<dyn Module>>,
  pub pins: PinSet,
}

/// Fetches, pins and checks out every dependency of a workspace.
pub struct DependencyResolver<'a, S = VcsModuleSource> {
  workspace: &'a Workspace,
  mode: SyncMode,
  source: S,
}

impl<'a> DependencyResolver<'a, VcsModuleSource> {
  pub fn new(workspace: &'a Workspace, mode: SyncMode) -> Self {
    DependencyResolver {
      workspace,
      mode,
      source: VcsModuleSource,
    }
  }
}

impl<'a, S: ModuleSource> DependencyResolver<'a, S> {
  /// Use `source` to open and fetch modules.
  pub fn with_source<T: ModuleSource>(self, source: T) -> DependencyResolver<'a, T> {
    DependencyResolver {
      workspace: self.workspace,
      mode: self.mode,
      source,
    }
  }

  pub fn resolve(&self) -> Result<Resolution, ResolveError> {
    let root = self.workspace.root();
    info!(root = %root.display(), mode = ?self.mode, "resolving workspace dependencies");

    let mut modules = vec![self.source.open(root)?];
    let mut pins = PinSet::default();
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(module_dir) = queue.pop_front() {
      let module_file = load_module_file(&module_dir.join(MODULE_FILE_NAME))?;
      debug!(module = %module_file.name, deps = module_file.deps.len(), "processing dependencies");

      for (name, dep) in &module_file.deps {
        let dep_dir = self.workspace.dep_dir(name);
        let dependency_error = |source| ResolveError::Dependency {
          name: name.clone(),
          source,
        };

        let module = self.source.open_or_fetch(&dep_dir, dep).map_err(dependency_error)?;

        if self.mode == SyncMode::Strict && !dep.is_pinned() {
          return Err(ResolveError::UnpinnedDependencyInStrictMode {
            name: name.clone(),
            module: module_file.name.clone(),
          });
        }

        if let Some(pin) = pins.get(name) {
          if !pin.accepts(dep) {
            return Err(ResolveError::PinConflict {
              name: name.clone(),
              expected: pin.commit.clone(),
              actual: if dep.is_pinned() { dep.hash.clone() } else { dep.version.clone() },
            });
          }
          debug!(name, commit = %pin.commit, "already pinned");
          continue;
        }

        let commit = self.pin_dependency(name, dep, module.as_ref()).map_err(|e| match e {
          ResolveError::Module(source) => dependency_error(source),
          other => other,
        })?;

        info!(name, commit = %commit, "pinned dependency");
        pins.insert(name.clone(), Pin::new(commit, dep));
        modules.push(module);
        queue.push_back(dep_dir);
      }
    }

    Ok(Resolution { modules, pins })
  }

  /// Bring `module` to the revision `dep` asks for and return its commit.
  fn pin_dependency(
    &self,
    name: &str,
    dep: &DependencyDefinition,
    module: &dyn Module,
  ) -> Result<String, ResolveError> {
    module.fetch()?;

    if dep.is_pinned() {
      let reachable = module.is_ancestor(&dep.hash, &dep.version).unwrap_or_else(|e| {
        debug!(name, error = %e, "ancestry query failed");
        false
      });
      if !reachable {
        return Err(ResolveError::UnreachablePin {
          name: name.to_string(),
          hash: dep.hash.clone(),
          version: dep.version.clone(),
        });
      }
    }

    let head = module.head()?;
    let at_target = if dep.is_pinned() {
      head.starts_with(&dep.hash)
    } else {
      head == dep.version
    };
    if at_target {
      return Ok(head);
    }

    let target = if dep.is_pinned() { &dep.hash } else { &dep.version };
    debug!(name, head = %head, target = %target, "checking out");
    module.checkout(target)?;
    Ok(module.head()?)
  }
}

/// Open every module of an already synced workspace without fetching.
///
/// Returns the root module first, then dependencies in discovery order.
pub fn open_workspace<S: ModuleSource>(
  workspace: &Workspace,
  source: &S,
) -> Result<Vec<Box<dyn Module>>, ResolveError> {
  let root = workspace.root();
  let mut modules = vec![source.open(root)?];
  let mut seen = BTreeSet::new();
  let mut queue = VecDeque::from([root.to_path_buf()]);

  while let Some(module_dir) = queue.pop_front() {
    let module_file = load_module_file(&module_dir.join(MODULE_FILE_NAME))?;
    for name in module_file.deps.keys() {
      if !seen.insert(name.clone()) {
        continue;
      }
      let dep_dir = workspace.dep_dir(name);
      let module = source.open(&dep_dir).map_err(|source| ResolveError::Dependency {
        name: name.clone(),
        source,
      })?;
      modules.push(module);
      queue.push_back(dep_dir);
    }
  }

  debug!(count = modules.len(), "opened workspace modules");
  Ok(modules)
}
