//! yabt-lib: dependency resolution and build-graph generation for yabt.
//!
//! - [`workspace`]: locate the workspace and resolve its dependency modules
//! - [`module`]: VCS-backed module checkouts and `MODULE.lua` manifests
//! - [`engine`]: run Lua build scripts that populate a [`graph::BuildGraph`]
//! - [`build`]: drive the whole pipeline and hand the result to Ninja

pub mod build;
pub mod consts;
pub mod engine;
pub mod graph;
pub mod lua;
pub mod module;
pub mod process;
pub mod util;
pub mod workspace;
