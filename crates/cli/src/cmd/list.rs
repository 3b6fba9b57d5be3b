//! Implementation of the `relaybuild list` command.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use relaybuild_lib::config::Implementation;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

#[derive(Debug, Serialize)]
struct ImplementationSummary<'a> {
  name: &'a str,
  source: &'static str,
  repository: Option<&'a str>,
  default_ref: &'a str,
  default_targets: &'a [String],
  targets: Vec<&'a str>,
}

impl<'a> From<&'a Implementation> for ImplementationSummary<'a> {
  fn from(implementation: &'a Implementation) -> Self {
    Self {
      name: &implementation.name,
      source: implementation.source.as_str(),
      repository: implementation.repository.as_deref(),
      default_ref: &implementation.default_ref,
      default_targets: &implementation.default_targets,
      targets: implementation.target_names(),
    }
  }
}

pub fn cmd_list(config_path: Option<&Path>, output: OutputFormat) -> Result<()> {
  let config = super::load_config(config_path)?;
  let summaries: Vec<ImplementationSummary<'_>> = config.implementations.iter().map(Into::into).collect();

  if output.is_json() {
    return print_json(&summaries);
  }

  if summaries.is_empty() {
    print_info("No implementations configured.");
    return Ok(());
  }

  for (i, summary) in summaries.iter().enumerate() {
    if i > 0 {
      println!();
    }
    print_info(summary.name);
    print_stat("Source", summary.source);
    if let Some(repository) = summary.repository {
      print_stat("Repository", repository);
      print_stat("Default ref", summary.default_ref);
    }
    print_stat("Targets", &summary.targets.join(", "));
    print_stat("Default targets", &summary.default_targets.join(", "));
  }

  Ok(())
}
