//! The provenance record written after a successful build.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::SourceDescriptor;

/// Errors raised while persisting or reading a provenance record.
#[derive(Debug, Error)]
pub enum ProvenanceError {
  #[error("failed to serialize provenance record: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to parse provenance record {}: {source}", path.display())]
  Parse {
    path: std::path::PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write provenance record {}: {source}", path.display())]
  Write {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read provenance record {}: {source}", path.display())]
  Read {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// One built image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
  pub target: String,
  pub image: String,
}

/// What was built, from which source, by which orchestrator revision.
///
/// Only the build pipeline creates records; everything else reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
  implementation: String,
  timestamp: String,
  runner_commit: String,
  source: SourceDescriptor,
  images: Vec<ImageRecord>,
}

impl ProvenanceRecord {
  /// Stamp a record with the current UTC time.
  pub(crate) fn capture(
    implementation: &str,
    runner_commit: String,
    source: SourceDescriptor,
    images: Vec<ImageRecord>,
  ) -> Self {
    Self::capture_at(Utc::now(), implementation, runner_commit, source, images)
  }

  pub(crate) fn capture_at(
    now: DateTime<Utc>,
    implementation: &str,
    runner_commit: String,
    source: SourceDescriptor,
    images: Vec<ImageRecord>,
  ) -> Self {
    Self {
      implementation: implementation.to_string(),
      timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
      runner_commit,
      source,
      images,
    }
  }

  pub fn implementation(&self) -> &str {
    &self.implementation
  }

  /// ISO-8601 UTC timestamp as recorded.
  pub fn timestamp(&self) -> &str {
    &self.timestamp
  }

  /// Parsed timestamp, if the stored value is well-formed.
  pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&self.timestamp)
      .ok()
      .map(|t| t.with_timezone(&Utc))
  }

  pub fn runner_commit(&self) -> &str {
    &self.runner_commit
  }

  pub fn source(&self) -> &SourceDescriptor {
    &self.source
  }

  pub fn images(&self) -> &[ImageRecord] {
    &self.images
  }

  /// Pretty-printed JSON, newline terminated.
  pub fn to_json(&self) -> Result<String, ProvenanceError> {
    let mut json = serde_json::to_string_pretty(self).map_err(ProvenanceError::Serialize)?;
    json.push('\n');
    Ok(json)
  }
}
