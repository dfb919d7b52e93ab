//! Lua state construction.
//!
//! Two flavours exist. Manifests are read in a sandbox without any standard
//! library so that a `MODULE.lua` can only describe data. Build scripts get
//! the safe standard libraries, an empty `package.path` (filled in later from
//! each module's rules directory) and the embedded `yabt.core.*` packages.

use std::path::Path;

use mlua::prelude::*;

use crate::consts::RULES_DIR_NAME;
use crate::lua::embedded;
use crate::util::path::to_slash;

/// Create a library-free Lua state for evaluating manifests.
pub fn create_sandbox_runtime() -> LuaResult<Lua> {
  Lua::new_with(LuaStdLib::NONE, LuaOptions::new())
}

/// Create a Lua state for build scripts.
///
/// Native modules are never loadable: `package.cpath` is cleared and stays
/// empty for the lifetime of the state.
pub fn create_build_runtime() -> LuaResult<Lua> {
  let lua = Lua::new();

  let package: LuaTable = lua.globals().get("package")?;
  package.set("path", "")?;
  package.set("cpath", "")?;

  embedded::install_preloads(&lua)?;

  Ok(lua)
}

/// Build a `package.path` value searching `<module>/rules` of every module.
pub fn rules_search_path<'a, I>(module_dirs: I) -> String
where
  I: IntoIterator<Item = &'a Path>,
{
  module_dirs
    .into_iter()
    .map(|dir| {
      let rules = to_slash(&dir.join(RULES_DIR_NAME));
      format!("{rules}/?.lua;{rules}/?/init.lua")
    })
    .collect::<Vec<_>>()
    .join(";")
}

/// Replace `package.path` on `lua`.
pub fn set_package_path(lua: &Lua, path: &str) -> LuaResult<()> {
  lua.globals().get::<LuaTable>("package")?.set("path", path)
}
