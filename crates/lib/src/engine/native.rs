//! Graph-building callbacks exposed on `yabt_native`.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;
use thiserror::Error;

use crate::graph::{BuildGraph, BuildRule, BuildStep, BuildStepWithRule, GraphError};
use crate::lua::codec::{DecodeError, FromScript};

/// Failures inside a native callback.
///
/// These are raised into Lua as runtime errors, so each message stands on
/// its own. [`super::BuildGraphEngine`] recovers them when the script that
/// triggered the callback returns.
#[derive(Debug, Clone, Error)]
pub enum NativeError {
  #[error("{function}() expects {expected} argument(s), got {actual}")]
  Arity {
    function: &'static str,
    expected: usize,
    actual: usize,
  },

  #[error("{function}(): invalid {argument}: {error}")]
  Decode {
    function: &'static str,
    argument: &'static str,
    error: DecodeError,
  },

  #[error("{function}(): {error}")]
  Graph {
    function: &'static str,
    error: GraphError,
  },
}

impl NativeError {
  /// The decode error behind this failure, if any.
  pub fn decode_error(&self) -> Option<&DecodeError> {
    match self {
      NativeError::Decode { error, .. } => Some(error),
      _ => None,
    }
  }

  /// The graph rule violation behind this failure, if any.
  pub fn graph_error(&self) -> Option<&GraphError> {
    match self {
      NativeError::Graph { error, .. } => Some(error),
      _ => None,
    }
  }
}

fn take_args<const N: usize>(function: &'static str, args: LuaMultiValue) -> Result<[LuaValue; N], NativeError> {
  let values: Vec<LuaValue> = args.into_iter().collect();
  let actual = values.len();
  values.try_into().map_err(|_| NativeError::Arity {
    function,
    expected: N,
    actual,
  })
}

fn decode_arg<T: FromScript>(function: &'static str, argument: &'static str, value: LuaValue) -> Result<T, NativeError> {
  T::from_script(value).map_err(|error| NativeError::Decode {
    function,
    argument,
    error,
  })
}

fn add_build_step(graph: &RefCell<BuildGraph>, args: LuaMultiValue) -> Result<(), NativeError> {
  const FUNCTION: &str = "add_build_step";
  let [step] = take_args::<1>(FUNCTION, args)?;
  let step: BuildStep = decode_arg(FUNCTION, "build step", step)?;
  graph
    .borrow_mut()
    .add_step(step)
    .map_err(|error| NativeError::Graph {
      function: FUNCTION,
      error,
    })
}

fn add_build_step_with_rule(graph: &RefCell<BuildGraph>, args: LuaMultiValue) -> Result<(), NativeError> {
  const FUNCTION: &str = "add_build_step_with_rule";
  let [rule, step] = take_args::<2>(FUNCTION, args)?;
  let rule: BuildRule = decode_arg(FUNCTION, "build rule", rule)?;
  let step: BuildStepWithRule = decode_arg(FUNCTION, "build step", step)?;
  graph
    .borrow_mut()
    .add_step_with_rule(rule, step)
    .map_err(|error| NativeError::Graph {
      function: FUNCTION,
      error,
    })
}

/// Register the graph callbacks on `native`, each holding its own handle to `graph`.
pub fn register_graph_callbacks(lua: &Lua, native: &LuaTable, graph: Rc<RefCell<BuildGraph>>) -> LuaResult<()> {
  let step_graph = graph.clone();
  native.set(
    "add_build_step",
    lua.create_function(move |_, args: LuaMultiValue| {
      add_build_step(&step_graph, args).map_err(LuaError::external)
    })?,
  )?;

  native.set(
    "add_build_step_with_rule",
    lua.create_function(move |_, args: LuaMultiValue| {
      add_build_step_with_rule(&graph, args).map_err(LuaError::external)
    })?,
  )?;

  Ok(())
}

/// Find a [`NativeError`] raised by a callback somewhere inside `err`.
pub fn find_native_error(err: &LuaError) -> Option<&NativeError> {
  match err {
    LuaError::CallbackError { cause, .. } => find_native_error(cause),
    LuaError::WithContext { cause, .. } => find_native_error(cause),
    LuaError::ExternalError(inner) => inner.downcast_ref::<NativeError>(),
    _ => None,
  }
}
