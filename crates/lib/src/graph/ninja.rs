//! Ninja file emission.
//!
//! Layout of the generated file:
//!
//! ```ninja
//! rule step0
//!     command = cc -c in.c -o out.o
//!     description = compile
//! rule cc
//!     command = cc $cflags -c $in -o $out
//!     description = CC $out
//!     cflags = -O2
//! build out.o : step0 in.c
//! build lib.o : cc lib.c
//!     cflags = -O0
//! ```
//!
//! Every anonymous step gets its own `stepN` rule, N being its index among
//! the anonymous steps. Named rules follow in name order, then all build
//! statements in registration order.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::BuildGraph;

const INDENT: &str = "    ";

/// Escape a path for use in a `build` line.
pub fn escape_path(path: &str) -> String {
  let mut escaped = String::with_capacity(path.len());
  for c in path.chars() {
    if matches!(c, '$' | ' ' | ':') {
      escaped.push('$');
    }
    escaped.push(c);
  }
  escaped
}

fn write_variable<W: Write>(out: &mut W, key: &str, value: &str) -> io::Result<()> {
  writeln!(out, "{INDENT}{key} = {value}")
}

fn write_rule<W: Write>(out: &mut W, name: &str, cmd: &str, descr: &str) -> io::Result<()> {
  writeln!(out, "rule {name}")?;
  write_variable(out, "command", cmd)?;
  if !descr.is_empty() {
    write_variable(out, "description", descr)?;
  }
  Ok(())
}

fn write_build<W: Write>(out: &mut W, outs: &[String], rule: &str, ins: &[String]) -> io::Result<()> {
  write!(out, "build")?;
  for path in outs {
    write!(out, " {}", escape_path(path))?;
  }
  write!(out, " : {rule}")?;
  for path in ins {
    write!(out, " {}", escape_path(path))?;
  }
  writeln!(out)
}

/// Serialize `graph` in Ninja syntax.
pub fn write_ninja<W: Write>(out: &mut W, graph: &BuildGraph) -> io::Result<()> {
  for (i, step) in graph.steps().iter().enumerate() {
    write_rule(out, &format!("step{i}"), &step.cmd, &step.descr)?;
  }

  for rule in graph.rules().values() {
    write_rule(out, &rule.name, &rule.cmd, &rule.descr)?;
    for (key, value) in rule.variables.iter().filter(|(key, _)| !key.is_empty()) {
      write_variable(out, key, value)?;
    }
  }

  for (i, step) in graph.steps().iter().enumerate() {
    write_build(out, &step.outs, &format!("step{i}"), &step.ins)?;
  }

  for step in graph.steps_with_rule() {
    write_build(out, &step.outs, &step.rule_name, &step.ins)?;
    for (key, value) in &step.variables {
      if key.is_empty() || value.is_empty() {
        continue;
      }
      write_variable(out, key, value)?;
    }
  }

  Ok(())
}

/// Render `graph` to a string.
pub fn render_ninja(graph: &BuildGraph) -> String {
  let mut buf = Vec::new();
  // Writing into a Vec cannot fail.
  let _ = write_ninja(&mut buf, graph);
  String::from_utf8_lossy(&buf).into_owned()
}

/// Write `graph` to `path`, creating parent directories as needed.
pub fn save_ninja_file(path: &Path, graph: &BuildGraph) -> io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }

  let mut out = BufWriter::new(File::create(path)?);
  write_ninja(&mut out, graph)?;
  out.flush()?;

  debug!(
    path = %path.display(),
    rules = graph.rules().len(),
    steps = graph.steps().len() + graph.steps_with_rule().len(),
    "wrote ninja file"
  );
  Ok(())
}
