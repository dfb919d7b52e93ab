//! Locating build and rule files on disk.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::BuildError;

/// Lazily yields every regular file named `file_name` below a root.
///
/// Entries are visited depth-first in file name order, so the sequence is
/// stable across runs and platforms.
pub struct FileFinder {
  walker: walkdir::IntoIter,
  file_name: &'static str,
}

impl FileFinder {
  pub fn new(root: &Path, file_name: &'static str) -> Self {
    FileFinder {
      walker: WalkDir::new(root).sort_by_file_name().into_iter(),
      file_name,
    }
  }
}

impl Iterator for FileFinder {
  type Item = Result<PathBuf, BuildError>;

  fn next(&mut self) -> Option<Self::Item> {
    for entry in self.walker.by_ref() {
      match entry {
        Ok(entry) if entry.file_type().is_file() && entry.file_name() == self.file_name => {
          return Some(Ok(entry.into_path()));
        }
        Ok(_) => continue,
        Err(e) => {
          let path = e.path().map(Path::to_path_buf).unwrap_or_default();
          return Some(Err(BuildError::Walk { path, source: e }));
        }
      }
    }
    None
  }
}
