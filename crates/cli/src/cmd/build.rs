//! Implementation of the `relaybuild build` command.
//!
//! Progress goes to stderr; the provenance record is the only thing written
//! to stdout, so `relaybuild build quiche > build.json` captures it verbatim.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use relaybuild_lib::build::CommandBuilder;
use relaybuild_lib::pipeline::{Tools, run_build};
use relaybuild_lib::source::{Git, SourceSelection};

use crate::BuildArgs;
use crate::output::{format_duration, print_progress, print_progress_success, print_warning, truncate_hash};

pub fn cmd_build(config_path: Option<&Path>, args: BuildArgs) -> Result<()> {
  let config = super::load_config(config_path)?;

  let selection = SourceSelection {
    git_ref: args.git_ref,
    local_path: args.local,
    repo_override: args.repo,
    target: args.target,
  };

  let vcs = Git::new(config.git.as_str());
  let builder = CommandBuilder::new(config.build_tool.as_str());
  let tools = Tools {
    vcs: &vcs,
    builder: &builder,
  };

  print_progress(&format!("Building {}", args.implementation));
  let outcome = run_build(&config, &args.implementation, &selection, tools)
    .with_context(|| format!("Build of '{}' failed", args.implementation))?;

  let source = outcome.record.source();
  if source.dirty {
    print_warning(&format!(
      "Built from a dirty tree at {}; the image may not match any commit",
      truncate_hash(&source.commit)
    ));
  }
  for image in outcome.record.images() {
    print_progress_success(&format!("{} {}", image.target, image.image));
  }
  print_progress(&format!(
    "Wrote {} in {}",
    outcome.provenance_path.display(),
    format_duration(outcome.elapsed)
  ));

  let mut stdout = std::io::stdout().lock();
  stdout
    .write_all(outcome.json.as_bytes())
    .context("Failed to write provenance record to stdout")?;
  stdout.flush()?;

  Ok(())
}
