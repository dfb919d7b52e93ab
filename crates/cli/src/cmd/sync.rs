//! `yabt sync`: fetch and pin every dependency.

use std::time::Instant;

use anyhow::Result;
use yabt_lib::workspace::{DependencyResolver, SyncMode, Workspace};

use crate::output::{OutputFormat, format_duration, print_json, print_mapping, print_success, truncate_hash};

pub fn cmd_sync(strict: bool, format: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let workspace = Workspace::discover()?;
  let mode = if strict { SyncMode::Strict } else { SyncMode::Normal };
  let resolution = DependencyResolver::new(&workspace, mode).resolve()?;

  if format.is_json() {
    return print_json(&resolution.pins);
  }

  for (name, pin) in resolution.pins.iter() {
    print_mapping(name, truncate_hash(&pin.commit));
  }
  print_success(&format!(
    "Synced {} module(s) in {}",
    resolution.modules.len(),
    format_duration(start.elapsed())
  ));
  Ok(())
}
