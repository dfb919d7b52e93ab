//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};
use std::process;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Rules module shared by the fixtures: `cc.object(src)` adds a compile step.
pub const CC_RULES: &str = r#"
local M = {}
function M.object(src)
  local out = src:gsub("%.c$", ".o")
  yabt_native.add_build_step_with_rule(
    { name = "cc", cmd = "cc -c $in -o $out", descr = "CC $out" },
    { outs = { out }, ins = { src } }
  )
  return out
end
return M
"#;

/// Isolated workspace environment.
///
/// The workspace root is `<temp>/app`; other directories under the temp dir
/// are free for upstream repositories.
pub struct TestEnv {
  pub temp: TempDir,
  pub root: PathBuf,
}

impl TestEnv {
  /// An empty workspace root (no `MODULE.lua` yet).
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap().join("app");
    std::fs::create_dir_all(&root).unwrap();
    Self { temp, root }
  }

  /// A workspace `app` that looks synced: `lib` is already under `DEPS`.
  pub fn synced() -> Self {
    let env = Self::empty();
    env.write_file("MODULE.lua", &manifest("app", &[("lib", "lib.git", "main", "")]));
    std::fs::create_dir_all(env.root.join(".git")).unwrap();

    env.write_file("DEPS/lib/MODULE.lua", &manifest("lib", &[]));
    std::fs::create_dir_all(env.root.join("DEPS/lib/.git")).unwrap();
    env.write_file("DEPS/lib/rules/cc/init.lua", CC_RULES);
    env.write_file("DEPS/lib/src/BUILD.lua", r#"require("cc").object("lib.c")"#);

    env.write_file(
      "src/BUILD.lua",
      r#"
      local context = require("yabt.core.context")
      local o = require("cc").object(context.source_relative("main.c"))
      yabt_native.add_build_step({ outs = { "app" }, ins = { o }, cmd = "cc -o app " .. o, descr = "LINK app" })
      "#,
    );
    env
  }

  /// Write a file relative to the workspace root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    write_file(&self.root, relative_path, content);
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root.join(relative_path)
  }

  /// A yabt command running in the workspace root.
  pub fn yabt(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("yabt");
    cmd.current_dir(&self.root).arg("--no-color").env_remove("RUST_LOG");
    cmd
  }
}

pub fn write_file(root: &Path, relative_path: &str, content: &str) {
  let path = root.join(relative_path);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
}

/// Render a `MODULE.lua`; each dependency is `(name, url, version, hash)`.
pub fn manifest(name: &str, deps: &[(&str, &str, &str, &str)]) -> String {
  let mut out = format!("return {{\n  name = \"{name}\",\n  version = 1,\n  deps = {{\n");
  for (dep, url, version, hash) in deps {
    out.push_str(&format!(
      "    [\"{dep}\"] = {{ url = \"{}\", version = \"{version}\", hash = \"{hash}\", type = \"git\" }},\n",
      url.replace('\\', "/")
    ));
  }
  out.push_str("  },\n}\n");
  out
}

pub fn git_available() -> bool {
  process::Command::new("git")
    .arg("--version")
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

/// Run git in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = process::Command::new("git")
    .args([
      "-c",
      "user.name=yabt",
      "-c",
      "user.email=yabt@example.invalid",
      "-c",
      "commit.gpgsign=false",
    ])
    .args(args)
    .current_dir(dir)
    .output()
    .unwrap();
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create an upstream repository on `main` and commit `files` to it.
///
/// Returns the commit id.
pub fn upstream_repo(dir: &Path, files: &[(&str, &str)]) -> String {
  std::fs::create_dir_all(dir).unwrap();
  git(dir, &["init", "--quiet"]);
  git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
  for (name, content) in files {
    write_file(dir, name, content);
    git(dir, &["add", name]);
  }
  git(dir, &["commit", "--quiet", "-m", "initial"]);
  git(dir, &["rev-parse", "HEAD"])
}
