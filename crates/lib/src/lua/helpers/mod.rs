//! Native Lua packages exposed to build scripts.

pub mod path;
