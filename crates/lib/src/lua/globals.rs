//! Globals visible to build scripts.
//!
//! - `SOURCE_DIR` / `OUTPUT_DIR` - absolute workspace and output roots
//! - `modules` - registered modules, keyed by name
//! - `yabt_native.add_build_step(step)` - append a self-contained step
//! - `yabt_native.add_build_step_with_rule(rule, step)` - append a step using a named rule
//! - `yabt_native.log_{verbose,debug,info,warn,error}(msg)` - forward to the host log
//!
//! The `yabt.core.path` package is installed alongside.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;
use tracing::{debug, error, info, trace, warn};

use super::helpers::path::{PathRoots, register_path_package};
use crate::engine::native::register_graph_callbacks;
use crate::graph::BuildGraph;
use crate::util::path::to_slash;

/// Name of the native callback table.
pub const NATIVE_TABLE: &str = "yabt_native";

/// Name of the global module registry table.
pub const MODULES_TABLE: &str = "modules";

fn register_log_functions(lua: &Lua, native: &LuaTable) -> LuaResult<()> {
  native.set(
    "log_verbose",
    lua.create_function(|_, msg: String| {
      trace!(target: "yabt::lua", "{}", msg);
      Ok(())
    })?,
  )?;
  native.set(
    "log_debug",
    lua.create_function(|_, msg: String| {
      debug!(target: "yabt::lua", "{}", msg);
      Ok(())
    })?,
  )?;
  native.set(
    "log_info",
    lua.create_function(|_, msg: String| {
      info!(target: "yabt::lua", "{}", msg);
      Ok(())
    })?,
  )?;
  native.set(
    "log_warn",
    lua.create_function(|_, msg: String| {
      warn!(target: "yabt::lua", "{}", msg);
      Ok(())
    })?,
  )?;
  native.set(
    "log_error",
    lua.create_function(|_, msg: String| {
      error!(target: "yabt::lua", "{}", msg);
      Ok(())
    })?,
  )?;
  Ok(())
}

/// Register all build-script globals, binding callbacks to `graph`.
pub fn register_globals(lua: &Lua, graph: Rc<RefCell<BuildGraph>>, roots: Rc<PathRoots>) -> LuaResult<()> {
  let globals = lua.globals();
  globals.set("SOURCE_DIR", to_slash(&roots.source))?;
  globals.set("OUTPUT_DIR", to_slash(&roots.output))?;
  globals.set(MODULES_TABLE, lua.create_table()?)?;

  let native = lua.create_table()?;
  register_graph_callbacks(lua, &native, graph)?;
  register_log_functions(lua, &native)?;
  globals.set(NATIVE_TABLE, native)?;

  register_path_package(lua, roots)?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use tracing_test::traced_test;

  use super::*;

  fn create_test_lua() -> LuaResult<(Lua, Rc<RefCell<BuildGraph>>)> {
    let lua = Lua::new();
    let graph = Rc::new(RefCell::new(BuildGraph::new()));
    let roots = Rc::new(PathRoots {
      source: PathBuf::from("/ws"),
      output: PathBuf::from("/ws/build"),
    });
    register_globals(&lua, graph.clone(), roots)?;
    Ok((lua, graph))
  }

  #[test]
  fn roots_are_exposed() -> LuaResult<()> {
    let (lua, _) = create_test_lua()?;
    let (src, out): (String, String) = lua.load("return SOURCE_DIR, OUTPUT_DIR").eval()?;
    assert_eq!(src, "/ws");
    assert_eq!(out, "/ws/build");
    Ok(())
  }

  #[test]
  fn modules_table_starts_empty() -> LuaResult<()> {
    let (lua, _) = create_test_lua()?;
    let modules: LuaTable = lua.globals().get(MODULES_TABLE)?;
    assert_eq!(modules.pairs::<LuaValue, LuaValue>().count(), 0);
    Ok(())
  }

  #[test]
  fn native_table_has_all_functions() -> LuaResult<()> {
    let (lua, _) = create_test_lua()?;
    let native: LuaTable = lua.globals().get(NATIVE_TABLE)?;
    for name in [
      "add_build_step",
      "add_build_step_with_rule",
      "log_verbose",
      "log_debug",
      "log_info",
      "log_warn",
      "log_error",
    ] {
      assert!(native.contains_key(name)?, "missing {name}");
    }
    Ok(())
  }

  #[test]
  fn callbacks_write_to_shared_graph() -> LuaResult<()> {
    let (lua, graph) = create_test_lua()?;
    lua
      .load(r#"yabt_native.add_build_step({ outs = { OUTPUT_DIR .. "/x" }, cmd = "touch $out" })"#)
      .exec()?;
    assert_eq!(graph.borrow().steps()[0].outs, vec!["/ws/build/x"]);
    Ok(())
  }

  #[test]
  fn path_package_is_requirable() -> LuaResult<()> {
    let (lua, _) = create_test_lua()?;
    let abs: String = lua
      .load(r#"return require("yabt.core.path").InPath.new_relative("a.c"):absolute()"#)
      .eval()?;
    assert_eq!(abs, "/ws/a.c");
    Ok(())
  }

  #[test]
  #[traced_test]
  fn log_functions_forward_to_tracing() -> LuaResult<()> {
    let (lua, _) = create_test_lua()?;
    lua.load(r#"yabt_native.log_warn("careful now")"#).exec()?;
    assert!(logs_contain("careful now"));
    Ok(())
  }
}
