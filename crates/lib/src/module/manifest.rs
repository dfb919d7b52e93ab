//! `MODULE.lua` manifests.
//!
//! A manifest is a Lua chunk returning a table:
//!
//! ```lua
//! return {
//!   name = "app",
//!   version = 1,
//!   deps = {
//!     lib = { url = "https://host/lib.git", version = "main", hash = "3f2a9c1", type = "git" },
//!   },
//!   flags = {},
//! }
//! ```
//!
//! It is evaluated in a state without any standard library, so it can only
//! describe data.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::consts::MODULE_FILE_VERSION;
use crate::lua::codec::{DecodeError, decode};
use crate::lua::runtime::create_sandbox_runtime;
use crate::script_record;

/// How to obtain one dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyDefinition {
  pub url: String,
  /// Branch, tag or other ref to follow.
  pub version: String,
  /// Pinned commit (or a prefix of one); empty when unpinned.
  pub hash: String,
  /// Backend tag, `type` in Lua. Inferred from the URL when empty.
  pub kind: String,
}

script_record!(DependencyDefinition {
  url,
  version,
  hash,
  kind => "type",
});

impl DependencyDefinition {
  pub fn is_pinned(&self) -> bool {
    !self.hash.is_empty()
  }
}

/// Parsed contents of a `MODULE.lua`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFile {
  pub name: String,
  pub version: i64,
  pub deps: BTreeMap<String, DependencyDefinition>,
  pub flags: BTreeMap<String, String>,
}

script_record!(ModuleFile {
  name,
  version,
  deps,
  flags,
});

/// Semantic problems with an otherwise well-formed manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("module file has no module name")]
  EmptyName,

  #[error("unsupported module file version: {0}")]
  UnsupportedVersion(i64),

  /// The name would not stay inside its own `DEPS/<name>` directory.
  #[error("invalid dependency name '{0}': must be a single path component")]
  InvalidDependencyName(String),
}

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("cannot read module file '{path}'")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("error loading module file '{path}': {message}")]
  Parse { path: PathBuf, message: String },

  #[error("invalid module file '{path}'")]
  Decode {
    path: PathBuf,
    #[source]
    source: DecodeError,
  },

  #[error("invalid module file '{path}'")]
  Validation {
    path: PathBuf,
    #[source]
    source: ValidationError,
  },
}

impl ModuleFile {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.name.is_empty() {
      return Err(ValidationError::EmptyName);
    }
    if self.version != MODULE_FILE_VERSION {
      return Err(ValidationError::UnsupportedVersion(self.version));
    }
    if let Some(name) = self.deps.keys().find(|name| !is_valid_dependency_name(name)) {
      return Err(ValidationError::InvalidDependencyName(name.clone()));
    }
    Ok(())
  }
}

/// Dependency names become directory names under `DEPS`.
fn is_valid_dependency_name(name: &str) -> bool {
  let mut components = Path::new(name).components();
  match (components.next(), components.next()) {
    (Some(Component::Normal(component)), None) => component == name,
    _ => false,
  }
}

/// Evaluate and validate manifest `source`; `path` names it in errors.
pub fn parse_module_file(source: &str, path: &Path) -> Result<ModuleFile, ManifestError> {
  let parse_error = |e: mlua::Error| ManifestError::Parse {
    path: path.to_path_buf(),
    message: e.to_string(),
  };

  let lua = create_sandbox_runtime().map_err(parse_error)?;
  let value: mlua::Value = lua
    .load(source)
    .set_name(format!("@{}", path.display()))
    .eval()
    .map_err(parse_error)?;

  let module_file: ModuleFile = decode(value).map_err(|e| ManifestError::Decode {
    path: path.to_path_buf(),
    source: e,
  })?;

  module_file.validate().map_err(|e| ManifestError::Validation {
    path: path.to_path_buf(),
    source: e,
  })?;

  Ok(module_file)
}

/// Read and parse the manifest at `path`.
pub fn load_module_file(path: &Path) -> Result<ModuleFile, ManifestError> {
  let source = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
    path: path.to_path_buf(),
    source: e,
  })?;
  parse_module_file(&source, path)
}
