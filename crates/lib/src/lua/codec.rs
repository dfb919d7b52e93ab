//! Conversion between Lua values and typed host records.
//!
//! Decoding is driven by the target type: [`FromScript`] is implemented for
//! the scalar and container types build scripts hand us, and
//! [`script_record!`](crate::script_record) declares the field layout of a
//! struct so it can be decoded from (and encoded to) a Lua table.
//!
//! Absent containers decode as empty and absent strings as `""`, mirroring
//! how scripts omit fields they don't care about. Anything else that doesn't
//! fit produces a [`DecodeError::TypeMismatch`] naming the Lua type that was
//! actually found, wrapped with the path of the offending field.

use std::collections::BTreeMap;

use mlua::prelude::*;
use thiserror::Error;

/// Errors produced while decoding a Lua value into a host type.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
  /// The Lua value had the wrong dynamic type.
  #[error("expected {expected}, found {actual}")]
  TypeMismatch {
    expected: &'static str,
    actual: &'static str,
  },

  /// A named struct field failed to decode.
  #[error("field '{field}': {source}")]
  Field {
    field: String,
    #[source]
    source: Box<DecodeError>,
  },

  /// An array element failed to decode (1-based, as seen from Lua).
  #[error("element {index}: {source}")]
  Element {
    index: usize,
    #[source]
    source: Box<DecodeError>,
  },

  /// The Lua runtime failed while we were reading the value.
  #[error("lua error while decoding: {0}")]
  Lua(String),
}

// Only the message is kept so the error stays `Send + Sync`.
impl From<LuaError> for DecodeError {
  fn from(err: LuaError) -> Self {
    DecodeError::Lua(err.to_string())
  }
}

impl DecodeError {
  /// Create a type mismatch for `value`.
  pub fn mismatch(expected: &'static str, value: &LuaValue) -> Self {
    DecodeError::TypeMismatch {
      expected,
      actual: value.type_name(),
    }
  }

  /// Strip field and element context, returning the innermost error.
  pub fn root_cause(&self) -> &DecodeError {
    match self {
      DecodeError::Field { source, .. } | DecodeError::Element { source, .. } => source.root_cause(),
      other => other,
    }
  }
}

/// A host type that can be decoded from a Lua value.
pub trait FromScript: Sized {
  fn from_script(value: LuaValue) -> Result<Self, DecodeError>;
}

/// A host type that can be encoded as a Lua value.
pub trait ToScript {
  fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue>;
}

/// Decode a Lua value into `T`.
pub fn decode<T: FromScript>(value: LuaValue) -> Result<T, DecodeError> {
  T::from_script(value)
}

/// Decode the field `key` of `table`, attaching the field name to any error.
pub fn field<T: FromScript>(table: &LuaTable, key: &str) -> Result<T, DecodeError> {
  let value: LuaValue = table.raw_get(key)?;
  T::from_script(value).map_err(|e| DecodeError::Field {
    field: key.to_string(),
    source: Box::new(e),
  })
}

/// Require `value` to be a table.
pub fn expect_table(value: LuaValue) -> Result<LuaTable, DecodeError> {
  match value {
    LuaValue::Table(table) => Ok(table),
    other => Err(DecodeError::mismatch("table", &other)),
  }
}

impl FromScript for LuaValue {
  fn from_script(value: LuaValue) -> Result<Self, DecodeError> {
    Ok(value)
  }
}

impl FromScript for String {
  fn from_script(value: LuaValue) -> Result<Self, DecodeError> {
    match value {
      LuaValue::Nil => Ok(String::new()),
      LuaValue::String(s) => Ok(s.to_str()?.to_string()),
      // Lua coerces numbers to strings wherever a string is expected.
      LuaValue::Integer(i) => Ok(i.to_string()),
      LuaValue::Number(n) => Ok(n.to_string()),
      other => Err(DecodeError::mismatch("string", &other)),
    }
  }
}

impl FromScript for i64 {
  fn from_script(value: LuaValue) -> Result<Self, DecodeError> {
    match value {
      LuaValue::Integer(i) => Ok(i),
      LuaValue::Number(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 => Ok(n as i64),
      other => Err(DecodeError::mismatch("integer", &other)),
    }
  }
}

impl FromScript for bool {
  fn from_script(value: LuaValue) -> Result<Self, DecodeError> {
    match value {
      LuaValue::Nil => Ok(false),
      LuaValue::Boolean(b) => Ok(b),
      other => Err(DecodeError::mismatch("boolean", &other)),
    }
  }
}

impl<T: FromScript> FromScript for Option<T> {
  fn from_script(value: LuaValue) -> Result<Self, DecodeError> {
    match value {
      LuaValue::Nil => Ok(None),
      other => T::from_script(other).map(Some),
    }
  }
}

impl<T: FromScript> FromScript for Vec<T> {
  fn from_script(value: LuaValue) -> Result<Self, DecodeError> {
    let table = match value {
      LuaValue::Nil => return Ok(Vec::new()),
      LuaValue::Table(table) => table,
      other => return Err(DecodeError::mismatch("array", &other)),
    };

    let len = table.raw_len();
    let mut result = Vec::with_capacity(len);
    for index in 1..=len {
      let element: LuaValue = table.raw_get(index)?;
      let decoded = T::from_script(element).map_err(|e| DecodeError::Element {
        index,
        source: Box::new(e),
      })?;
      result.push(decoded);
    }
    Ok(result)
  }
}

impl<V: FromScript> FromScript for BTreeMap<String, V> {
  fn from_script(value: LuaValue) -> Result<Self, DecodeError> {
    let table = match value {
      LuaValue::Nil => return Ok(BTreeMap::new()),
      LuaValue::Table(table) => table,
      other => return Err(DecodeError::mismatch("table", &other)),
    };

    let mut result = BTreeMap::new();
    for pair in table.pairs::<LuaValue, LuaValue>() {
      let (key, value) = pair?;
      let key = match key {
        LuaValue::String(_) | LuaValue::Integer(_) | LuaValue::Number(_) => String::from_script(key)?,
        other => return Err(DecodeError::mismatch("string key", &other)),
      };
      let decoded = V::from_script(value).map_err(|e| DecodeError::Field {
        field: key.clone(),
        source: Box::new(e),
      })?;
      result.insert(key, decoded);
    }
    Ok(result)
  }
}

impl ToScript for String {
  fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
    Ok(LuaValue::String(lua.create_string(self)?))
  }
}

impl ToScript for i64 {
  fn to_script(&self, _lua: &Lua) -> LuaResult<LuaValue> {
    Ok(LuaValue::Integer(*self))
  }
}

impl ToScript for bool {
  fn to_script(&self, _lua: &Lua) -> LuaResult<LuaValue> {
    Ok(LuaValue::Boolean(*self))
  }
}

impl<T: ToScript> ToScript for Option<T> {
  fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
    match self {
      Some(value) => value.to_script(lua),
      None => Ok(LuaValue::Nil),
    }
  }
}

impl<T: ToScript> ToScript for Vec<T> {
  fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
    let table = lua.create_table_with_capacity(self.len(), 0)?;
    for (i, value) in self.iter().enumerate() {
      table.raw_set(i + 1, value.to_script(lua)?)?;
    }
    Ok(LuaValue::Table(table))
  }
}

impl<V: ToScript> ToScript for BTreeMap<String, V> {
  fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
    let table = lua.create_table_with_capacity(0, self.len())?;
    for (key, value) in self {
      table.raw_set(key.as_str(), value.to_script(lua)?)?;
    }
    Ok(LuaValue::Table(table))
  }
}

/// Declare the Lua table layout of a struct.
///
/// Generates [`FromScript`] and [`ToScript`] implementations that read and
/// write each listed field under its own name, or under an explicit key
/// given with `=> "key"`. Field types come from the struct definition.
///
/// The record also implements [`mlua::FromLua`] and [`mlua::IntoLua`], so it
/// can be taken directly as a callback argument or stored into a table. A
/// failed conversion surfaces as an external [`DecodeError`].
///
/// ```ignore
/// script_record!(DependencyDefinition { url, version, hash, kind => "type" });
/// ```
#[macro_export]
macro_rules! script_record {
  ($ty:ident { $($field:ident $(=> $key:literal)?),* $(,)? }) => {
    impl $crate::lua::codec::FromScript for $ty {
      fn from_script(value: ::mlua::Value) -> ::std::result::Result<Self, $crate::lua::codec::DecodeError> {
        let table = $crate::lua::codec::expect_table(value)?;
        Ok(Self {
          $($field: $crate::lua::codec::field(&table, $crate::script_record!(@key $field $($key)?))?,)*
        })
      }
    }

    impl $crate::lua::codec::ToScript for $ty {
      fn to_script(&self, lua: &::mlua::Lua) -> ::mlua::Result<::mlua::Value> {
        let table = lua.create_table()?;
        $(
          table.raw_set(
            $crate::script_record!(@key $field $($key)?),
            $crate::lua::codec::ToScript::to_script(&self.$field, lua)?,
          )?;
        )*
        Ok(::mlua::Value::Table(table))
      }
    }

    impl ::mlua::FromLua for $ty {
      fn from_lua(value: ::mlua::Value, _lua: &::mlua::Lua) -> ::mlua::Result<Self> {
        <Self as $crate::lua::codec::FromScript>::from_script(value).map_err(::mlua::Error::external)
      }
    }

    impl ::mlua::IntoLua for $ty {
      fn into_lua(self, lua: &::mlua::Lua) -> ::mlua::Result<::mlua::Value> {
        $crate::lua::codec::ToScript::to_script(&self, lua)
      }
    }
  };
  (@key $field:ident $key:literal) => {
    $key
  };
  (@key $field:ident) => {
    stringify!($field)
  };
}
