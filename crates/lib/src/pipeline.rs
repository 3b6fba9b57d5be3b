//! The build pipeline for one implementation.
//!
//! resolve selection → plan targets → acquire source → build targets in order
//! → write provenance. Every step before acquisition is pure, so option and
//! target errors never touch the disk or run a tool.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::build::{ContainerBuilder, Executor, plan_targets};
use crate::config::Config;
use crate::consts::UNKNOWN_COMMIT;
use crate::error::Result;
use crate::provenance::{ProvenanceRecord, write_record};
use crate::source::{Acquirer, ResolvedSource, SourceControl, SourceSelection, resolve_selection};
use crate::workspace_lock::WorkspaceLock;

/// External tools the pipeline drives.
#[derive(Clone, Copy)]
pub struct Tools<'a> {
  pub vcs: &'a dyn SourceControl,
  pub builder: &'a dyn ContainerBuilder,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
  pub record: ProvenanceRecord,
  /// Where the record was written.
  pub provenance_path: PathBuf,
  /// The record exactly as written.
  pub json: String,
  pub elapsed: Duration,
}

/// Build `implementation` from `selection` and record provenance.
///
/// Nothing is written to the provenance file unless every requested target
/// built successfully.
pub fn run_build(
  config: &Config,
  implementation: &str,
  selection: &SourceSelection,
  tools: Tools<'_>,
) -> Result<BuildOutcome> {
  let start = Instant::now();
  let implementation = config.implementation(implementation)?;
  let source = resolve_selection(selection, implementation)?;
  let targets = plan_targets(implementation, selection.target.as_deref())?;

  debug!(
    implementation = %implementation.name,
    source = ?source,
    targets = ?targets.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
    "resolved build request"
  );

  let _lock = match source {
    ResolvedSource::Git { .. } => Some(WorkspaceLock::acquire(
      &config.workspace,
      &implementation.name,
      &format!("relaybuild build {}", implementation.name),
    )?),
    ResolvedSource::Local { .. } | ResolvedSource::Embedded => None,
  };

  let runner_commit = match tools.vcs.head_commit(&config.root) {
    Some(commit) => commit,
    None => {
      warn!(root = %config.root.display(), "orchestrator commit unknown, recording '{}'", UNKNOWN_COMMIT);
      UNKNOWN_COMMIT.to_string()
    }
  };

  let acquired = Acquirer::new(tools.vcs, &config.workspace, &config.root).acquire(implementation, &source)?;

  let images = Executor::new(tools.builder, config.ca_cert.as_deref()).build_all(&targets, &acquired.tree)?;

  let record = ProvenanceRecord::capture(&implementation.name, runner_commit, acquired.descriptor, images);
  let provenance_path = implementation.provenance_path();
  let json = write_record(&record, &provenance_path)?;

  info!(
    implementation = %implementation.name,
    images = record.images().len(),
    path = %provenance_path.display(),
    "build recorded"
  );

  Ok(BuildOutcome {
    record,
    provenance_path,
    json,
    elapsed: start.elapsed(),
  })
}
