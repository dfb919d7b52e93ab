//! The in-memory build graph.
//!
//! Build scripts populate a [`BuildGraph`] through the engine's native
//! callbacks; [`ninja`] serializes it. Rules are keyed by name and the first
//! registration wins. Steps keep their registration order all the way into
//! the emitted file.

pub mod ninja;
mod types;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

pub use types::{BuildRule, BuildStep, BuildStepWithRule};

/// Violations of the graph's structural rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  /// A step declared no outputs.
  #[error("build step '{description}' has no outputs")]
  MissingOutput { description: String },

  /// A rule was registered without a name.
  #[error("build rule with command '{cmd}' has no name")]
  MissingRuleName { cmd: String },

  /// The name is of the form `step<N>`, which anonymous steps use.
  #[error("build rule name '{name}' is reserved for anonymous steps")]
  ReservedRuleName { name: String },
}

/// Whether `name` could collide with a rule emitted for an anonymous step.
pub fn is_reserved_rule_name(name: &str) -> bool {
  name
    .strip_prefix("step")
    .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

fn check_rule_name(rule: &BuildRule) -> Result<(), GraphError> {
  if rule.name.is_empty() {
    return Err(GraphError::MissingRuleName { cmd: rule.cmd.clone() });
  }
  if is_reserved_rule_name(&rule.name) {
    return Err(GraphError::ReservedRuleName {
      name: rule.name.clone(),
    });
  }
  Ok(())
}

/// Rules and steps accumulated while build scripts run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildGraph {
  rules: BTreeMap<String, BuildRule>,
  steps: Vec<BuildStep>,
  steps_with_rule: Vec<BuildStepWithRule>,
}

impl BuildGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a self-contained step.
  pub fn add_step(&mut self, step: BuildStep) -> Result<(), GraphError> {
    if step.outs.is_empty() {
      let description = if step.descr.is_empty() { &step.cmd } else { &step.descr };
      return Err(GraphError::MissingOutput {
        description: description.clone(),
      });
    }

    self.steps.push(step);
    Ok(())
  }

  /// Register `rule` unless a rule with the same name already exists.
  ///
  /// Returns whether the rule was inserted.
  pub fn add_rule(&mut self, rule: BuildRule) -> Result<bool, GraphError> {
    check_rule_name(&rule)?;

    if let Some(existing) = self.rules.get(&rule.name) {
      if *existing != rule {
        debug!(rule = %rule.name, "ignoring redefinition of build rule with a different body");
      }
      return Ok(false);
    }

    self.rules.insert(rule.name.clone(), rule);
    Ok(true)
  }

  /// Register `rule` (first registration wins) and append a step using it.
  ///
  /// An empty `rule_name` on the step refers to `rule`. Nothing is recorded
  /// when either half is invalid.
  pub fn add_step_with_rule(&mut self, rule: BuildRule, mut step: BuildStepWithRule) -> Result<(), GraphError> {
    check_rule_name(&rule)?;
    if step.rule_name.is_empty() {
      step.rule_name = rule.name.clone();
    }
    if step.outs.is_empty() {
      return Err(GraphError::MissingOutput {
        description: step.rule_name,
      });
    }

    self.add_rule(rule)?;
    self.steps_with_rule.push(step);
    Ok(())
  }

  pub fn rules(&self) -> &BTreeMap<String, BuildRule> {
    &self.rules
  }

  pub fn steps(&self) -> &[BuildStep] {
    &self.steps
  }

  pub fn steps_with_rule(&self) -> &[BuildStepWithRule] {
    &self.steps_with_rule
  }

  /// Every declared output, anonymous steps first, in registration order.
  pub fn targets(&self) -> impl Iterator<Item = &str> {
    self
      .steps
      .iter()
      .flat_map(|s| s.outs.iter())
      .chain(self.steps_with_rule.iter().flat_map(|s| s.outs.iter()))
      .map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty() && self.steps.is_empty() && self.steps_with_rule.is_empty()
  }
}
