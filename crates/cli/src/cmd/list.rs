//! `yabt list`: print build targets matching the given patterns.

use anyhow::{Context, Result, bail};
use regex::Regex;
use yabt_lib::build::generate_graph;
use yabt_lib::workspace::Workspace;

use crate::output::print_json;

/// Compile `patterns` so that each must match a whole target.
fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
  patterns
    .iter()
    .map(|p| Regex::new(&format!("^(?:{p})$")).with_context(|| format!("Invalid pattern '{p}'")))
    .collect()
}

/// Targets matching any of `patterns`; every target when there are none.
fn select_targets<'a>(targets: impl Iterator<Item = &'a str>, patterns: &[Regex]) -> Vec<&'a str> {
  targets
    .filter(|t| patterns.is_empty() || patterns.iter().any(|p| p.is_match(t)))
    .collect()
}

pub fn cmd_list(patterns: &[String], json: bool) -> Result<()> {
  let regexes = compile_patterns(patterns)?;

  let workspace = Workspace::discover()?;
  let build_dir = workspace.build_dir(None);
  let graph = generate_graph(&workspace, &build_dir).context("Failed to generate build graph")?;

  let matched = select_targets(graph.targets(), &regexes);
  if matched.is_empty() && !regexes.is_empty() {
    bail!("No matched targets");
  }

  if json {
    return print_json(&matched);
  }
  for target in matched {
    println!("{target}");
  }
  Ok(())
}
