//! Lua integration.
//!
//! - [`codec`] - typed conversion between Lua values and host records
//! - [`runtime`] - construction of sandboxed and build-script Lua states
//! - [`globals`] - globals and native callbacks visible to build scripts
//! - [`helpers`] - native packages (`yabt.core.path`)
//! - [`embedded`] - Lua sources compiled into the binary

pub mod codec;
pub mod embedded;
pub mod globals;
pub mod helpers;
pub mod runtime;
