//! Source selection and descriptor types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What the user asked for, before validation and defaulting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSelection {
  /// Remote branch, tag or commit (`--ref`).
  pub git_ref: Option<String>,
  /// Existing local working tree (`--local`).
  pub local_path: Option<PathBuf>,
  /// Replacement upstream repository (`--repo`).
  pub repo_override: Option<String>,
  /// Single target to build (`--target`); `None` or empty means the default set.
  pub target: Option<String>,
}

/// A validated source origin. Exactly one mode is ever selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
  Git { repository: String, git_ref: String },
  Local { path: PathBuf },
  Embedded,
}

/// Kind of source recorded in provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
  Git,
  Local,
  Embedded,
}

impl SourceType {
  pub fn as_str(self) -> &'static str {
    match self {
      SourceType::Git => "git",
      SourceType::Local => "local",
      SourceType::Embedded => "embedded",
    }
  }
}

/// The source that was actually built, as written to provenance.
///
/// Fixed once acquisition has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
  #[serde(rename = "type")]
  pub kind: SourceType,
  pub repository: String,
  #[serde(rename = "ref")]
  pub git_ref: String,
  pub local_path: Option<PathBuf>,
  pub commit: String,
  pub dirty: bool,
}

/// A materialized working tree plus its descriptor.
#[derive(Debug, Clone)]
pub struct AcquiredSource {
  pub descriptor: SourceDescriptor,
  /// Directory used as the build context.
  pub tree: PathBuf,
}
