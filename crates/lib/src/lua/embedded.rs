//! Lua sources compiled into the binary.

use mlua::prelude::*;

/// Bootstrap script run by the orchestrator before and after module
/// registration.
pub const RUNTIME_SCRIPT: &str = include_str!("../../lua/runtime.lua");

/// Chunk name reported for errors raised inside the bootstrap script.
pub const RUNTIME_CHUNK_NAME: &str = "yabt/runtime.lua";

const PACKAGES: &[(&str, &str)] = &[
  ("yabt.core.context", include_str!("../../lua/yabt/core/context.lua")),
  ("yabt.core.utils", include_str!("../../lua/yabt/core/utils.lua")),
];

/// Register every embedded package in `package.preload`.
pub fn install_preloads(lua: &Lua) -> LuaResult<()> {
  let preload: LuaTable = lua.globals().get::<LuaTable>("package")?.get("preload")?;
  for (name, source) in PACKAGES {
    let loader = lua.load(*source).set_name(format!("={name}")).into_function()?;
    preload.set(*name, loader)?;
  }
  Ok(())
}
