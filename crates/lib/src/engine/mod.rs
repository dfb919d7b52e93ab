//! The build-graph construction engine.
//!
//! A [`BuildGraphEngine`] owns one Lua state for one orchestration pass.
//! Scripts executed through it call back into the engine via `yabt_native`
//! to register rules and steps; the accumulated [`BuildGraph`] is taken out
//! at the end with [`BuildGraphEngine::into_graph`].
//!
//! Errors raised by native callbacks travel through Lua as runtime errors
//! and are recovered into [`EngineError::Native`] at the script boundary, so
//! callers can match on the original [`NativeError`].

pub mod native;

use std::cell::{Ref, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::graph::BuildGraph;
use crate::lua::globals::{MODULES_TABLE, register_globals};
use crate::lua::helpers::path::PathRoots;
use crate::lua::runtime::{create_build_runtime, rules_search_path, set_package_path};
use crate::script_record;
use crate::util::path::to_slash;

pub use native::NativeError;

/// Errors surfaced by script execution.
#[derive(Debug, Error)]
pub enum EngineError {
  /// A native callback rejected its arguments.
  #[error("build script '{chunk}' failed")]
  Native {
    chunk: String,
    #[source]
    source: NativeError,
  },

  /// The script itself raised an error.
  #[error("build script '{chunk}' failed: {message}")]
  Script { chunk: String, message: String },

  #[error("cannot read build script '{path}'")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("lua runtime error: {0}")]
  Lua(String),
}

impl From<LuaError> for EngineError {
  fn from(err: LuaError) -> Self {
    EngineError::Lua(err.to_string())
  }
}

impl EngineError {
  /// Classify an error returned by running `chunk`.
  fn from_script(chunk: &str, err: LuaError) -> Self {
    if let Some(native) = native::find_native_error(&err) {
      debug!(chunk, error = %err, "native callback failed");
      return EngineError::Native {
        chunk: chunk.to_string(),
        source: native.clone(),
      };
    }
    EngineError::Script {
      chunk: chunk.to_string(),
      message: err.to_string(),
    }
  }
}

/// A module entry as seen from Lua through the `modules` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredModule {
  /// Absolute path of the module root.
  pub path: String,
  /// Module root relative to the workspace root.
  pub relative_path: String,
  /// Directories under `<module>/src` holding a `BUILD.lua`; `.` for `src` itself.
  pub build_files: Vec<String>,
}

script_record!(RegisteredModule {
  path,
  relative_path,
  build_files,
});

impl RegisteredModule {
  pub fn new(path: &Path, relative_path: &Path, build_files: Vec<String>) -> Self {
    RegisteredModule {
      path: to_slash(path),
      relative_path: to_slash(relative_path),
      build_files,
    }
  }
}

/// Runs build scripts against a shared [`BuildGraph`].
pub struct BuildGraphEngine {
  lua: Lua,
  graph: Rc<RefCell<BuildGraph>>,
  roots: Rc<PathRoots>,
}

impl BuildGraphEngine {
  /// Create an engine whose scripts see `source_root` and `output_root`.
  ///
  /// Both roots should be absolute.
  pub fn new(source_root: &Path, output_root: &Path) -> Result<Self, EngineError> {
    let lua = create_build_runtime()?;
    let graph = Rc::new(RefCell::new(BuildGraph::new()));
    let roots = Rc::new(PathRoots {
      source: source_root.to_path_buf(),
      output: output_root.to_path_buf(),
    });

    register_globals(&lua, graph.clone(), roots.clone())?;

    Ok(BuildGraphEngine { lua, graph, roots })
  }

  pub fn source_root(&self) -> &Path {
    &self.roots.source
  }

  pub fn output_root(&self) -> &Path {
    &self.roots.output
  }

  /// Make `rules/?.lua` and `rules/?/init.lua` of every module requirable.
  pub fn set_search_path<'a, I>(&self, module_dirs: I) -> Result<(), EngineError>
  where
    I: IntoIterator<Item = &'a Path>,
  {
    let path = rules_search_path(module_dirs);
    debug!(package_path = %path, "setting lua search path");
    set_package_path(&self.lua, &path)?;
    Ok(())
  }

  /// Execute the script at `path`.
  pub fn exec_file(&self, path: &Path) -> Result<(), EngineError> {
    let source = std::fs::read_to_string(path).map_err(|e| EngineError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    let chunk = path.display().to_string();
    debug!(chunk = %chunk, "executing build script");
    self
      .lua
      .load(&source)
      .set_name(format!("@{chunk}"))
      .exec()
      .map_err(|e| EngineError::from_script(&chunk, e))
  }

  /// Execute `source`, reporting errors under `chunk_name`.
  pub fn exec_source(&self, source: &str, chunk_name: &str) -> Result<(), EngineError> {
    debug!(chunk = chunk_name, "executing build script");
    self
      .lua
      .load(source)
      .set_name(format!("@{chunk_name}"))
      .exec()
      .map_err(|e| EngineError::from_script(chunk_name, e))
  }

  /// Publish `module` as `modules[name]`.
  pub fn register_module(&self, name: &str, module: &RegisteredModule) -> Result<(), EngineError> {
    debug!(name, path = %module.path, build_files = module.build_files.len(), "registering module");
    let modules: LuaTable = self.lua.globals().get(MODULES_TABLE)?;
    modules.set(name, module.clone())?;
    Ok(())
  }

  /// The graph accumulated so far.
  pub fn graph(&self) -> Ref<'_, BuildGraph> {
    self.graph.borrow()
  }

  /// Finish the pass and take the accumulated graph.
  pub fn into_graph(self) -> BuildGraph {
    let graph = std::mem::take(&mut *self.graph.borrow_mut());
    graph
  }

  pub fn lua(&self) -> &Lua {
    &self.lua
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::GraphError;
  use crate::lua::codec::{DecodeError, decode};

  fn engine() -> BuildGraphEngine {
    BuildGraphEngine::new(Path::new("/ws"), Path::new("/ws/build")).unwrap()
  }

  mod scripts {
    use super::*;

    #[test]
    fn compile_step_lands_in_graph() {
      let engine = engine();
      engine
        .exec_source(
          r#"yabt_native.add_build_step({outs={"out.o"}, ins={"in.c"}, cmd="cc -c in.c -o out.o", descr="compile"})"#,
          "BUILD.lua",
        )
        .unwrap();

      let graph = engine.into_graph();
      assert_eq!(graph.steps().len(), 1);
      assert_eq!(graph.steps()[0].outs, vec!["out.o"]);
      assert_eq!(graph.steps()[0].descr, "compile");
    }

    #[test]
    fn missing_output_is_recovered() {
      let engine = engine();
      let err = engine
        .exec_source(r#"yabt_native.add_build_step({ cmd = "true" })"#, "BUILD.lua")
        .unwrap_err();
      match err {
        EngineError::Native { chunk, source } => {
          assert_eq!(chunk, "BUILD.lua");
          assert!(matches!(source.graph_error(), Some(GraphError::MissingOutput { .. })));
        }
        other => panic!("expected Native, got {other:?}"),
      }
      assert!(engine.graph().steps().is_empty());
    }

    #[test]
    fn type_mismatch_is_recovered_through_nested_calls() {
      let engine = engine();
      let err = engine
        .exec_source(
          r#"
          local function helper(step) yabt_native.add_build_step(step) end
          helper({ outs = { "a" }, ins = { 42, true } })
          "#,
          "BUILD.lua",
        )
        .unwrap_err();
      let EngineError::Native { source, .. } = err else {
        panic!("expected Native error");
      };
      assert!(matches!(
        source.decode_error().map(DecodeError::root_cause),
        Some(DecodeError::TypeMismatch {
          expected: "string",
          actual: "boolean"
        })
      ));
    }

    #[test]
    fn script_errors_carry_message() {
      let engine = engine();
      let err = engine.exec_source(r#"error("boom")"#, "BUILD.lua").unwrap_err();
      match err {
        EngineError::Script { chunk, message } => {
          assert_eq!(chunk, "BUILD.lua");
          assert!(message.contains("boom"));
        }
        other => panic!("expected Script, got {other:?}"),
      }
    }

    #[test]
    fn exec_file_reads_from_disk() {
      let temp_dir = tempfile::TempDir::new().unwrap();
      let path = temp_dir.path().join("BUILD.lua");
      std::fs::write(&path, r#"yabt_native.add_build_step({ outs = { "x" }, cmd = "touch x" })"#).unwrap();

      let engine = engine();
      engine.exec_file(&path).unwrap();
      assert_eq!(engine.graph().steps().len(), 1);
    }

    #[test]
    fn exec_file_missing_is_read_error() {
      let err = engine().exec_file(Path::new("/definitely/not/here/BUILD.lua")).unwrap_err();
      assert!(matches!(err, EngineError::Read { .. }));
    }
  }

  mod modules {
    use super::*;

    #[test]
    fn registered_module_is_visible() {
      let engine = engine();
      let module = RegisteredModule::new(
        Path::new("/ws/DEPS/lib"),
        Path::new("DEPS/lib"),
        vec![".".to_string(), "net".to_string()],
      );
      engine.register_module("lib", &module).unwrap();

      let value: LuaValue = engine.lua().load("return modules.lib").eval().unwrap();
      assert_eq!(decode::<RegisteredModule>(value).unwrap(), module);

      let relative: String = engine.lua().load("return modules.lib.relative_path").eval().unwrap();
      assert_eq!(relative, "DEPS/lib");
    }
  }

  mod search_path {
    use super::*;

    #[test]
    fn rules_are_requirable_after_setting_path() {
      let temp_dir = tempfile::TempDir::new().unwrap();
      std::fs::create_dir_all(temp_dir.path().join("rules")).unwrap();
      std::fs::write(
        temp_dir.path().join("rules").join("cc.lua"),
        "return { binary = function(name) yabt_native.add_build_step({ outs = { name }, cmd = 'ld' }) end }",
      )
      .unwrap();

      let engine = engine();
      engine.set_search_path([temp_dir.path()]).unwrap();
      engine
        .exec_source(r#"require("cc").binary("app")"#, "BUILD.lua")
        .unwrap();
      assert_eq!(engine.graph().targets().collect::<Vec<_>>(), vec!["app"]);
    }
  }

  #[test]
  fn embedded_context_is_available() {
    let engine = engine();
    engine
      .exec_source(
        r#"
        local context = require("yabt.core.context")
        assert(context.current() == nil)
        context.enter("app", { relative_path = "." }, "net")
        assert(context.source_relative("a.c") == "src/net/a.c")
        context.leave()
        "#,
        "test.lua",
      )
      .unwrap();
  }
}
