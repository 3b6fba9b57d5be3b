//! Per-target build execution.
//!
//! Targets are validated up front, then built one at a time in order. The
//! first failure stops the run; targets after it are not attempted.

use std::path::Path;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Implementation, Target};
use crate::consts::CA_CERT_SECRET_ID;
use crate::provenance::ImageRecord;

use super::stage::{StageError, StagedFile};
use super::tool::{BuildRequest, BuildSecret, ContainerBuilder, ToolError};

/// Errors raised while planning or running target builds.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("unknown target '{target}' for '{implementation}' (known: {known})")]
  UnknownTarget {
    target: String,
    implementation: String,
    known: String,
  },

  #[error("failed to stage entrypoint for target '{target}': {source}")]
  Stage {
    target: String,
    #[source]
    source: StageError,
  },

  #[error("build failed for target '{target}': {source}")]
  Failed {
    target: String,
    #[source]
    source: ToolError,
  },
}

/// Targets to build for `requested`, in build order.
///
/// `None` or an empty name selects the implementation's default targets. Pure:
/// nothing is read from disk and no tool runs.
pub fn plan_targets<'a>(implementation: &'a Implementation, requested: Option<&str>) -> Result<Vec<&'a Target>, BuildError> {
  match requested.map(str::trim).filter(|s| !s.is_empty()) {
    Some(name) => implementation
      .target(name)
      .map(|t| vec![t])
      .ok_or_else(|| BuildError::UnknownTarget {
        target: name.to_string(),
        implementation: implementation.name.clone(),
        known: implementation.target_names().join(", "),
      }),
    None => implementation
      .default_targets
      .iter()
      .map(|name| {
        implementation.target(name).ok_or_else(|| BuildError::UnknownTarget {
          target: name.clone(),
          implementation: implementation.name.clone(),
          known: implementation.target_names().join(", "),
        })
      })
      .collect(),
  }
}

/// Runs builds for planned targets against one source tree.
pub struct Executor<'a> {
  builder: &'a dyn ContainerBuilder,
  secrets: Vec<BuildSecret>,
}

impl<'a> Executor<'a> {
  /// `ca_cert` is forwarded as a build secret when the file exists.
  pub fn new(builder: &'a dyn ContainerBuilder, ca_cert: Option<&Path>) -> Self {
    let secrets = match ca_cert {
      Some(path) if path.is_file() => vec![BuildSecret {
        id: CA_CERT_SECRET_ID.to_string(),
        path: path.to_path_buf(),
      }],
      Some(path) => {
        warn!(path = %path.display(), "CA certificate not found, building without it");
        Vec::new()
      }
      None => Vec::new(),
    };
    Self { builder, secrets }
  }

  /// Build every target in order; stops at the first failure.
  pub fn build_all(&self, targets: &[&Target], context: &Path) -> Result<Vec<ImageRecord>, BuildError> {
    let mut images = Vec::with_capacity(targets.len());
    for target in targets {
      images.push(self.build_one(target, context)?);
    }
    Ok(images)
  }

  fn build_one(&self, target: &Target, context: &Path) -> Result<ImageRecord, BuildError> {
    let start = Instant::now();

    // Held until the end of this function so the copy is removed on every path.
    let _staged = match &target.entrypoint {
      Some(script) => StagedFile::stage(script, context).map_err(|e| BuildError::Stage {
        target: target.name.clone(),
        source: e,
      })?,
      None => None,
    };

    let request = BuildRequest {
      build_file: &target.build_file,
      context,
      image: &target.image,
      secrets: &self.secrets,
    };

    self.builder.build(&request).map_err(|e| BuildError::Failed {
      target: target.name.clone(),
      source: e,
    })?;

    info!(
      target = %target.name,
      image = %target.image,
      elapsed_ms = start.elapsed().as_millis() as u64,
      "target built"
    );

    Ok(ImageRecord {
      target: target.name.clone(),
      image: target.image.clone(),
    })
  }
}
