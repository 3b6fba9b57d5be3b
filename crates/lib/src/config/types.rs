//! Configuration types.
//!
//! [`ConfigFile`] and friends mirror `relaybuild.toml` as written. They are
//! turned into [`Config`], where every path is absolute and every default has
//! been applied.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::PROVENANCE_FILENAME;

/// Where an implementation's source code comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  /// Cloned from a remote repository into the workspace.
  #[default]
  Git,
  /// Committed inside the orchestrator repository itself.
  Embedded,
}

impl SourceKind {
  pub fn as_str(self) -> &'static str {
    match self {
      SourceKind::Git => "git",
      SourceKind::Embedded => "embedded",
    }
  }
}

/// Top-level `relaybuild.toml` document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
  pub workspace: Option<String>,
  pub build_tool: Option<String>,
  pub git: Option<String>,
  pub ca_cert: Option<String>,
  #[serde(default, rename = "implementation")]
  pub implementations: Vec<ImplementationDecl>,
}

/// One `[[implementation]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplementationDecl {
  pub name: String,
  pub dir: Option<String>,
  #[serde(default)]
  pub source: SourceKind,
  pub repository: Option<String>,
  pub default_ref: Option<String>,
  pub default_targets: Option<Vec<String>>,
  #[serde(default, rename = "target")]
  pub targets: Vec<TargetDecl>,
}

/// One `[[implementation.target]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
  pub name: String,
  pub build_file: String,
  pub image: String,
  pub entrypoint: Option<String>,
}

/// Fully resolved orchestrator configuration.
#[derive(Debug, Clone)]
pub struct Config {
  /// Directory containing `relaybuild.toml`.
  pub root: PathBuf,
  /// Directory holding cached clones, one per implementation.
  pub workspace: PathBuf,
  /// Program invoked for container builds.
  pub build_tool: String,
  /// Program invoked for version-control operations.
  pub git: String,
  /// Optional CA certificate forwarded as a build secret.
  pub ca_cert: Option<PathBuf>,
  pub implementations: Vec<Implementation>,
}

/// A buildable protocol implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Implementation {
  pub name: String,
  /// Absolute path of the implementation directory inside the orchestrator root.
  pub dir: PathBuf,
  pub source: SourceKind,
  /// Upstream repository; always `Some` for git sources.
  pub repository: Option<String>,
  pub default_ref: String,
  /// Targets built when no target is requested, in build order.
  pub default_targets: Vec<String>,
  pub targets: Vec<Target>,
}

impl Implementation {
  pub fn target(&self, name: &str) -> Option<&Target> {
    self.targets.iter().find(|t| t.name == name)
  }

  pub fn target_names(&self) -> Vec<&str> {
    self.targets.iter().map(|t| t.name.as_str()).collect()
  }

  /// Path of the provenance record for this implementation.
  pub fn provenance_path(&self) -> PathBuf {
    self.dir.join(PROVENANCE_FILENAME)
  }

  /// Cached clone location for git sources.
  pub fn clone_dir(&self, workspace: &Path) -> PathBuf {
    workspace.join(&self.name)
  }
}

/// One buildable artifact of an implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
  pub name: String,
  pub build_file: PathBuf,
  pub image: String,
  pub entrypoint: Option<PathBuf>,
}
