//! Tests for `yabt sync` against real git repositories.

use predicates::prelude::*;

use crate::common::{CC_RULES, TestEnv, git_available, manifest, upstream_repo};

fn upstream_lib(env: &TestEnv) -> (String, String) {
  let path = env.temp.path().join("upstream").join("lib");
  let commit = upstream_repo(
    &path,
    &[
      ("MODULE.lua", manifest("lib", &[]).as_str()),
      ("rules/cc/init.lua", CC_RULES),
      ("src/BUILD.lua", r#"require("cc").object("lib.c")"#),
    ],
  );
  (path.to_string_lossy().into_owned(), commit)
}

fn app_repo(env: &TestEnv, deps: &[(&str, &str, &str, &str)]) {
  env.write_file("MODULE.lua", &manifest("app", deps));
  std::fs::create_dir_all(env.path(".git")).unwrap();
}

#[test]
fn sync_checks_out_pinned_dependency() {
  if !git_available() {
    return;
  }
  let env = TestEnv::empty();
  let (url, commit) = upstream_lib(&env);
  app_repo(&env, &[("lib", url.as_str(), "main", &commit[..10])]);

  env
    .yabt()
    .arg("sync")
    .assert()
    .success()
    .stdout(predicate::str::contains(&commit[..12]))
    .stdout(predicate::str::contains("Synced 2 module(s)"));

  assert!(env.path("DEPS/lib/MODULE.lua").is_file());

  // a second sync is a no-op on an already pinned checkout
  env.yabt().arg("sync").assert().success();

  env.yabt().arg("list").assert().success().stdout("lib.o\n");
}

#[test]
fn sync_json_reports_pins() {
  if !git_available() {
    return;
  }
  let env = TestEnv::empty();
  let (url, commit) = upstream_lib(&env);
  app_repo(&env, &[("lib", url.as_str(), "main", "")]);

  let output = env.yabt().args(["sync", "--format", "json"]).output().unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

  let pins: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(pins["lib"]["commit"], commit.as_str());
  assert_eq!(pins["lib"]["version"], "main");
  assert_eq!(pins["lib"]["hash"], "");
}

#[test]
fn strict_sync_rejects_unpinned_dependency() {
  if !git_available() {
    return;
  }
  let env = TestEnv::empty();
  let (url, _) = upstream_lib(&env);
  app_repo(&env, &[("lib", url.as_str(), "main", "")]);

  env
    .yabt()
    .args(["sync", "--strict"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("dependency 'lib' of 'app' is not pinned"));
}

#[test]
fn sync_reports_unreachable_hash() {
  if !git_available() {
    return;
  }
  let env = TestEnv::empty();
  let (url, _) = upstream_lib(&env);
  app_repo(&env, &[("lib", url.as_str(), "main", "0000000000000000000000000000000000000000")]);

  env
    .yabt()
    .arg("sync")
    .assert()
    .failure()
    .stderr(predicate::str::contains("is not an ancestor"));
}

#[test]
fn sync_reports_fetch_failure() {
  if !git_available() {
    return;
  }
  let env = TestEnv::empty();
  let missing = env.temp.path().join("nowhere.git").to_string_lossy().into_owned();
  app_repo(&env, &[("lib", missing.as_str(), "main", "")]);

  env
    .yabt()
    .arg("sync")
    .assert()
    .failure()
    .stderr(predicate::str::contains("dependency 'lib'"));
}
