//! The `yabt.core.path` package.
//!
//! Build scripts describe files relative to one of two roots: the workspace
//! source tree (`InPath`) or the output directory (`OutPath`). Both are
//! userdata wrapping a normalized absolute path:
//!
//! ```lua
//! local path = require("yabt.core.path")
//! local src = path.InPath.new_relative("src/main.c")
//! local obj = src:with_ext("o")      -- OutPath at <output>/src/main.o
//! print(obj:relative(), obj:absolute(), src:ext())
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::prelude::*;

use crate::util::path::{normalize, relative_to, to_slash};

/// Name under which the package is installed in `package.loaded`.
pub const PATH_PACKAGE_NAME: &str = "yabt.core.path";

/// The two absolute roots build scripts are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRoots {
  pub source: PathBuf,
  pub output: PathBuf,
}

/// Selects which root a [`ScriptPath`] is anchored to.
pub trait PathKind: 'static {
  const TYPE_NAME: &'static str;

  fn root(roots: &PathRoots) -> &Path;
}

/// Marker for paths under the source root.
#[derive(Debug)]
pub enum Source {}

/// Marker for paths under the output root.
#[derive(Debug)]
pub enum Output {}

impl PathKind for Source {
  const TYPE_NAME: &'static str = "InPath";

  fn root(roots: &PathRoots) -> &Path {
    &roots.source
  }
}

impl PathKind for Output {
  const TYPE_NAME: &'static str = "OutPath";

  fn root(roots: &PathRoots) -> &Path {
    &roots.output
  }
}

pub type InPath = ScriptPath<Source>;
pub type OutPath = ScriptPath<Output>;

/// A path handed to Lua, anchored to the root selected by `K`.
pub struct ScriptPath<K: PathKind> {
  absolute: PathBuf,
  roots: Rc<PathRoots>,
  _kind: PhantomData<K>,
}

impl<K: PathKind> ScriptPath<K> {
  /// Anchor `relative` under this kind's root.
  pub fn new_relative(roots: Rc<PathRoots>, relative: &Path) -> Self {
    let absolute = normalize(&K::root(&roots).join(relative));
    ScriptPath {
      absolute,
      roots,
      _kind: PhantomData,
    }
  }

  pub fn absolute(&self) -> &Path {
    &self.absolute
  }

  /// The path expressed relative to its own root.
  pub fn relative(&self) -> PathBuf {
    relative_to(&self.absolute, K::root(&self.roots))
  }

  /// The extension including the leading dot, or `""` when there is none.
  pub fn ext(&self) -> String {
    self
      .absolute
      .extension()
      .map(|e| format!(".{}", e.to_string_lossy()))
      .unwrap_or_default()
  }

  /// Re-anchor this path under the output root with a new extension.
  ///
  /// `ext` may be given with or without its leading dot.
  pub fn with_ext(&self, ext: &str) -> OutPath {
    let mut relative = self.relative();
    relative.set_extension(ext.trim_start_matches('.'));
    OutPath::new_relative(self.roots.clone(), &relative)
  }
}

impl<K: PathKind> fmt::Debug for ScriptPath<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({})", K::TYPE_NAME, self.absolute.display())
  }
}

impl<K: PathKind> LuaUserData for ScriptPath<K> {
  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_method("absolute", |_, this, ()| Ok(to_slash(this.absolute())));
    methods.add_method("relative", |_, this, ()| Ok(to_slash(&this.relative())));
    methods.add_method("ext", |_, this, ()| Ok(this.ext()));
    methods.add_method("with_ext", |_, this, ext: String| Ok(this.with_ext(&ext)));
    methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| Ok(to_slash(this.absolute())));
    methods.add_meta_method(LuaMetaMethod::Eq, |_, this, other: LuaAnyUserData| {
      Ok(
        other
          .borrow::<ScriptPath<K>>()
          .map(|other| other.absolute == this.absolute)
          .unwrap_or(false),
      )
    });
  }
}

fn create_constructor<K: PathKind>(lua: &Lua, roots: Rc<PathRoots>) -> LuaResult<LuaTable> {
  let table = lua.create_table()?;
  table.set(
    "new_relative",
    lua.create_function(move |_, relative: String| {
      Ok(ScriptPath::<K>::new_relative(roots.clone(), Path::new(&relative)))
    })?,
  )?;
  Ok(table)
}

/// Whether `value` is an `InPath` or an `OutPath`.
pub fn is_path(value: &LuaValue) -> bool {
  match value {
    LuaValue::UserData(ud) => ud.is::<InPath>() || ud.is::<OutPath>(),
    _ => false,
  }
}

/// Whether `value` is an `OutPath`.
pub fn is_out_path(value: &LuaValue) -> bool {
  matches!(value, LuaValue::UserData(ud) if ud.is::<OutPath>())
}

/// Create the `yabt.core.path` table.
pub fn create_path_package(lua: &Lua, roots: Rc<PathRoots>) -> LuaResult<LuaTable> {
  let package = lua.create_table()?;
  package.set("InPath", create_constructor::<Source>(lua, roots.clone())?)?;
  package.set("OutPath", create_constructor::<Output>(lua, roots)?)?;
  package.set("is_path", lua.create_function(|_, value: LuaValue| Ok(is_path(&value)))?)?;
  package.set(
    "is_out_path",
    lua.create_function(|_, value: LuaValue| Ok(is_out_path(&value)))?,
  )?;
  Ok(package)
}

/// Install `yabt.core.path` into `package.loaded` so `require` finds it.
pub fn register_path_package(lua: &Lua, roots: Rc<PathRoots>) -> LuaResult<()> {
  let package = create_path_package(lua, roots)?;
  let loaded: LuaTable = lua.globals().get::<LuaTable>("package")?.get("loaded")?;
  loaded.set(PATH_PACKAGE_NAME, package)
}
