//! Test utilities for yabt-lib.
//!
//! Cross-platform shell helpers plus fixtures that create real git
//! repositories and workspaces in temporary directories.

use std::path::Path;
use std::process::Command;

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Whether a usable `git` binary is on PATH.
///
/// Git-backed tests return early when this is false.
pub fn git_available() -> bool {
  Command::new("git")
    .arg("--version")
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

/// Run git in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = Command::new("git")
    .args([
      "-c",
      "user.name=yabt",
      "-c",
      "user.email=yabt@example.invalid",
      "-c",
      "commit.gpgsign=false",
      "-c",
      "init.defaultBranch=main",
    ])
    .args(args)
    .current_dir(dir)
    .output()
    .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialize a repository on branch `main`.
pub fn init_repo(dir: &Path) {
  std::fs::create_dir_all(dir).unwrap();
  git(dir, &["init", "--quiet"]);
  git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
}

/// Write a file, commit it, and return the new commit id.
pub fn commit_file(dir: &Path, name: &str, content: &str) -> String {
  let path = dir.join(name);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
  git(dir, &["add", name]);
  git(dir, &["commit", "--quiet", "-m", &format!("update {}", name)]);
  git(dir, &["rev-parse", "HEAD"])
}

/// Write a file relative to `root`, creating parent directories.
pub fn write_file(root: &Path, relative_path: &str, content: &str) {
  let path = root.join(relative_path);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
}

/// Render a minimal `MODULE.lua`.
///
/// Each dependency is `(name, url, version, hash)`.
pub fn manifest(name: &str, deps: &[(&str, &str, &str, &str)]) -> String {
  let mut out = format!("return {{\n  name = \"{}\",\n  version = 1,\n  deps = {{\n", name);
  for (dep, url, version, hash) in deps {
    out.push_str(&format!(
      "    [\"{}\"] = {{ url = \"{}\", version = \"{}\", hash = \"{}\", type = \"git\" }},\n",
      dep,
      url.replace('\\', "/"),
      version,
      hash
    ));
  }
  out.push_str("  },\n  flags = {},\n}\n");
  out
}
