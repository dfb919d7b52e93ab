//! Tests for `yabt list`, `yabt build` and `yabt clean`.

use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn list_prints_every_target() {
  let env = TestEnv::synced();

  env
    .yabt()
    .arg("list")
    .assert()
    .success()
    .stdout("app\nsrc/main.o\nlib.o\n");
}

#[test]
fn list_filters_by_full_match() {
  let env = TestEnv::synced();

  env.yabt().args(["list", ".*\\.o"]).assert().success().stdout("src/main.o\nlib.o\n");
  env.yabt().args(["list", "ap", "lib.o"]).assert().success().stdout("lib.o\n");
}

#[test]
fn list_without_matches_fails() {
  let env = TestEnv::synced();

  env
    .yabt()
    .args(["list", "nothing"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("No matched targets"))
    .stderr(predicate::str::contains("Usage: yabt list"));
}

#[test]
fn list_json_outputs_array() {
  let env = TestEnv::synced();

  let output = env.yabt().args(["list", "--json"]).output().unwrap();
  assert!(output.status.success());
  let targets: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(targets, ["app", "src/main.o", "lib.o"]);
}

#[test]
fn build_writes_ninja_file_and_runs_executor() {
  let env = TestEnv::synced();

  env
    .yabt()
    .args(["build", "--threads", "2"])
    .env("YABT_NINJA", "true")
    .assert()
    .success()
    .stdout(predicate::str::contains("build.ninja"))
    .stdout(predicate::str::contains("Build finished"));

  let ninja = std::fs::read_to_string(env.path("build/build.ninja")).unwrap();
  assert!(ninja.starts_with("rule step0\n"));
  assert!(ninja.contains("    description = LINK app\n"));
  assert!(ninja.contains("rule cc\n"));
  assert!(ninja.contains("build lib.o : cc lib.c\n"));
}

#[test]
fn build_honors_build_dir_override() {
  let env = TestEnv::synced();

  env
    .yabt()
    .args(["build", "--build-dir", "out/debug"])
    .env("YABT_NINJA", "true")
    .assert()
    .success();

  assert!(env.path("out/debug/build.ninja").is_file());
  assert!(!env.path("build").exists());
}

#[test]
fn build_reports_executor_failure() {
  let env = TestEnv::synced();

  env
    .yabt()
    .arg("build")
    .env("YABT_NINJA", "false")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to run build executor 'false'"));

  // the graph is written before the executor runs
  assert!(env.path("build/build.ninja").is_file());
}

#[test]
fn build_reports_script_errors() {
  let env = TestEnv::synced();
  env.write_file("src/BUILD.lua", "yabt_native.add_build_step({ ins = { 'a' }, cmd = 'touch' })");

  env
    .yabt()
    .arg("build")
    .env("YABT_NINJA", "true")
    .assert()
    .failure()
    .stderr(predicate::str::contains("has no outputs"));
}

#[test]
fn clean_removes_build_dir() {
  let env = TestEnv::synced();
  env.yabt().arg("build").env("YABT_NINJA", "true").assert().success();
  assert!(env.path("build").is_dir());

  env
    .yabt()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed"));
  assert!(!env.path("build").exists());
  assert!(env.path("DEPS/lib").is_dir());

  env
    .yabt()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
fn clean_deps_removes_checkouts() {
  let env = TestEnv::synced();

  env.yabt().args(["clean", "--deps"]).assert().success();
  assert!(!env.path("DEPS").exists());
}

#[test]
fn clean_refuses_to_remove_workspace() {
  let env = TestEnv::synced();

  env
    .yabt()
    .args(["clean", "--build-dir", "."])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Refusing to remove"));
  assert!(env.path("MODULE.lua").is_file());
}
