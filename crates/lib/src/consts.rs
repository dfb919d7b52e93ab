//! Fixed workspace layout conventions.

/// Manifest file at the root of every module.
pub const MODULE_FILE_NAME: &str = "MODULE.lua";

/// Build description file, discovered under a module's source tree.
pub const BUILD_FILE_NAME: &str = "BUILD.lua";

/// Rule initializer file, discovered under a module's rules tree.
pub const INIT_FILE_NAME: &str = "INIT.lua";

/// Directory (relative to the workspace root) holding dependency checkouts.
pub const DEPS_DIR_NAME: &str = "DEPS";

/// Default output directory, relative to the workspace root.
pub const BUILD_DIR_NAME: &str = "build";

/// Name of the emitted graph file inside the output directory.
pub const NINJA_FILE_NAME: &str = "build.ninja";

/// Per-module source tree holding `BUILD.lua` files.
pub const SRC_DIR_NAME: &str = "src";

/// Per-module rules tree added to the Lua search path.
pub const RULES_DIR_NAME: &str = "rules";

/// Environment variable overriding the Ninja executable.
pub const NINJA_ENV_VAR: &str = "YABT_NINJA";

/// Only supported `MODULE.lua` schema version.
pub const MODULE_FILE_VERSION: i64 = 1;
