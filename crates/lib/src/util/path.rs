//! Lexical path manipulation.
//!
//! These helpers never touch the filesystem: build graph paths frequently
//! name files that do not exist yet.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push("..");
        }
      }
      Component::CurDir => {}
      _ => normalized.push(component),
    }
  }
  normalized
}

/// Express `path` relative to `base`, walking up with `..` where needed.
///
/// Both paths are normalized first. Returns `.` when they are equal.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
  let path = normalize(path);
  let base = normalize(base);

  let path_components: Vec<_> = path.components().collect();
  let base_components: Vec<_> = base.components().collect();

  let common_len = path_components
    .iter()
    .zip(base_components.iter())
    .take_while(|(a, b)| a == b)
    .count();

  let mut relative = PathBuf::new();
  for _ in common_len..base_components.len() {
    relative.push("..");
  }
  for component in path_components.iter().skip(common_len) {
    relative.push(component);
  }

  if relative.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    relative
  }
}

/// Render a path with forward slashes, as Lua scripts and ninja expect.
pub fn to_slash(path: &Path) -> String {
  let rendered = path.to_string_lossy();
  if cfg!(windows) {
    rendered.replace('\\', "/")
  } else {
    rendered.into_owned()
  }
}
