//! Build orchestration.
//!
//! Turning a synced workspace into a `build.ninja` happens in a fixed order:
//!
//! 1. open every module of the workspace (no fetching)
//! 2. create a [`BuildGraphEngine`] bound to the workspace and output roots,
//!    with each module's `rules` directory on the Lua search path
//! 3. run every `INIT.lua` found under the modules' `rules` trees, then the
//!    bootstrap script
//! 4. register each module together with the directories of its `BUILD.lua`
//!    files, then run the bootstrap again to evaluate them
//! 5. write the accumulated graph and hand it to Ninja

pub mod discover;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{BUILD_FILE_NAME, INIT_FILE_NAME, NINJA_ENV_VAR, NINJA_FILE_NAME};
use crate::engine::{BuildGraphEngine, EngineError, RegisteredModule};
use crate::graph::BuildGraph;
use crate::graph::ninja::save_ninja_file;
use crate::lua::embedded::{RUNTIME_CHUNK_NAME, RUNTIME_SCRIPT};
use crate::module::{Module, VcsModuleSource};
use crate::process;
use crate::util::path::{relative_to, to_slash};
use crate::workspace::{ResolveError, Workspace, open_workspace};

use discover::FileFinder;

/// Errors that can occur while generating or executing a build.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Engine(#[from] EngineError),

  #[error("cannot write '{path}'")]
  Emit {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot scan '{path}'")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to run build executor '{program}': {reason}")]
  ExecutorInvocationFailed { program: String, reason: String },
}

/// Create an engine for `modules` with their rules directories searchable.
pub fn prepare_engine(
  ws_root: &Path,
  build_dir: &Path,
  modules: &[Box<dyn Module>],
) -> Result<BuildGraphEngine, BuildError> {
  let engine = BuildGraphEngine::new(ws_root, build_dir)?;

  let with_rules: Vec<&Path> = modules
    .iter()
    .filter(|m| m.rules_dir().is_some())
    .map(|m| m.disk_path())
    .collect();
  engine.set_search_path(with_rules)?;

  Ok(engine)
}

/// Run every `INIT.lua` below each module's rules directory, then the bootstrap.
pub fn invoke_rule_initializers(engine: &BuildGraphEngine, modules: &[Box<dyn Module>]) -> Result<(), BuildError> {
  for module in modules {
    let Some(rules_dir) = module.rules_dir() else {
      continue;
    };

    for init_file in FileFinder::new(&rules_dir, INIT_FILE_NAME) {
      let init_file = init_file?;
      debug!(module = module.name(), file = %init_file.display(), "executing rule initializer");
      engine.exec_file(&init_file)?;
    }
  }

  run_bootstrap(engine)
}

/// Directories (relative to `src_dir`) that contain a `BUILD.lua`.
pub fn find_build_dirs(src_dir: &Path) -> Result<Vec<String>, BuildError> {
  if !src_dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut dirs = Vec::new();
  for build_file in FileFinder::new(src_dir, BUILD_FILE_NAME) {
    let build_file = build_file?;
    let dir = build_file.parent().unwrap_or(src_dir);
    dirs.push(to_slash(&relative_to(dir, src_dir)));
  }
  Ok(dirs)
}

/// Register every module with its build directories, then run the bootstrap.
pub fn invoke_build_targets(
  engine: &BuildGraphEngine,
  ws_root: &Path,
  modules: &[Box<dyn Module>],
) -> Result<(), BuildError> {
  for module in modules {
    let build_dirs = find_build_dirs(&module.src_dir())?;
    if build_dirs.is_empty() {
      debug!(module = module.name(), "no build files");
    }

    let registered = RegisteredModule::new(
      module.disk_path(),
      &relative_to(module.disk_path(), ws_root),
      build_dirs,
    );
    engine.register_module(module.name(), &registered)?;
  }

  run_bootstrap(engine)
}

fn run_bootstrap(engine: &BuildGraphEngine) -> Result<(), BuildError> {
  engine.exec_source(RUNTIME_SCRIPT, RUNTIME_CHUNK_NAME)?;
  Ok(())
}

/// Evaluate all build scripts of `workspace` into a graph.
pub fn generate_graph(workspace: &Workspace, build_dir: &Path) -> Result<BuildGraph, BuildError> {
  let modules = open_workspace(workspace, &VcsModuleSource)?;
  info!(modules = modules.len(), build_dir = %build_dir.display(), "generating build graph");

  let engine = prepare_engine(workspace.root(), build_dir, &modules)?;
  invoke_rule_initializers(&engine, &modules)?;
  invoke_build_targets(&engine, workspace.root(), &modules)?;

  Ok(engine.into_graph())
}

/// Write `graph` to `<build_dir>/build.ninja` and return the file's path.
pub fn emit(graph: &BuildGraph, build_dir: &Path) -> Result<PathBuf, BuildError> {
  let path = build_dir.join(NINJA_FILE_NAME);
  save_ninja_file(&path, graph).map_err(|e| BuildError::Emit {
    path: path.clone(),
    source: e,
  })?;
  Ok(path)
}

/// The Ninja executable: `$YABT_NINJA` if set, else `ninja`.
pub fn ninja_program() -> String {
  std::env::var(NINJA_ENV_VAR)
    .ok()
    .filter(|p| !p.is_empty())
    .unwrap_or_else(|| "ninja".to_string())
}

/// Run Ninja in `build_dir` with `threads` parallel jobs.
pub fn run_ninja(build_dir: &Path, threads: usize) -> Result<(), BuildError> {
  let program = ninja_program();
  let threads = threads.to_string();
  info!(program = %program, threads = %threads, "running build executor");

  let exit = process::run_inherited(&program, ["-j", threads.as_str()], Some(build_dir)).map_err(|e| {
    BuildError::ExecutorInvocationFailed {
      program: program.clone(),
      reason: e.to_string(),
    }
  })?;

  if !exit.success() {
    return Err(BuildError::ExecutorInvocationFailed {
      program,
      reason: exit.to_string(),
    });
  }
  Ok(())
}
