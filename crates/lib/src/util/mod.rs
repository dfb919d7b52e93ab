//! Shared utilities.
//!
//! Lexical path helpers used by the engine and its Lua helpers, plus test
//! fixtures.

pub mod path;

#[cfg(test)]
pub mod testutil;
