use std::collections::BTreeMap;

use crate::script_record;

/// A named Ninja rule shared by any number of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRule {
  pub name: String,
  pub cmd: String,
  pub descr: String,
  pub variables: BTreeMap<String, String>,
  /// Whether commands of this rule belong in a compilation database.
  pub compdb: bool,
}

script_record!(BuildRule {
  name,
  cmd,
  descr,
  variables,
  compdb,
});

/// A step carrying its own command; emitted with an anonymous `stepN` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStep {
  pub outs: Vec<String>,
  pub ins: Vec<String>,
  pub cmd: String,
  pub descr: String,
}

script_record!(BuildStep { outs, ins, cmd, descr });

/// A step that invokes a named [`BuildRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStepWithRule {
  pub outs: Vec<String>,
  pub ins: Vec<String>,
  pub rule_name: String,
  pub variables: BTreeMap<String, String>,
}

script_record!(BuildStepWithRule {
  outs,
  ins,
  rule_name,
  variables,
});
