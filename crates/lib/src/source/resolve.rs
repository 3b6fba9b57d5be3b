//! Turns a [`SourceSelection`] into a [`ResolvedSource`].
//!
//! Pure validation and defaulting: nothing here touches the filesystem or the
//! network, so every conflict is reported before any external tool runs.

use thiserror::Error;

use crate::config::{Implementation, SourceKind};

use super::types::{ResolvedSource, SourceSelection};

/// Conflicting or inapplicable source options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
  #[error("{first} and {second} are mutually exclusive")]
  Conflict { first: &'static str, second: &'static str },

  #[error("{option} cannot be used with '{implementation}': its source is embedded in this repository")]
  EmbeddedOverride {
    option: &'static str,
    implementation: String,
  },
}

fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validate `selection` against `implementation` and pick exactly one source mode.
pub fn resolve_selection(
  selection: &SourceSelection,
  implementation: &Implementation,
) -> Result<ResolvedSource, SelectionError> {
  let git_ref = non_empty(&selection.git_ref);
  let repo = non_empty(&selection.repo_override);
  let local = selection.local_path.as_ref().filter(|p| !p.as_os_str().is_empty());

  if git_ref.is_some() && local.is_some() {
    return Err(SelectionError::Conflict {
      first: "--ref",
      second: "--local",
    });
  }
  if repo.is_some() && local.is_some() {
    return Err(SelectionError::Conflict {
      first: "--repo",
      second: "--local",
    });
  }

  if implementation.source == SourceKind::Embedded {
    let option = if git_ref.is_some() {
      Some("--ref")
    } else if repo.is_some() {
      Some("--repo")
    } else if local.is_some() {
      Some("--local")
    } else {
      None
    };
    if let Some(option) = option {
      return Err(SelectionError::EmbeddedOverride {
        option,
        implementation: implementation.name.clone(),
      });
    }
    return Ok(ResolvedSource::Embedded);
  }

  if let Some(path) = local {
    return Ok(ResolvedSource::Local { path: path.clone() });
  }

  // Config validation guarantees a repository for git sources.
  let repository = repo
    .map(str::to_string)
    .or_else(|| implementation.repository.clone())
    .unwrap_or_default();

  Ok(ResolvedSource::Git {
    repository,
    git_ref: git_ref.unwrap_or(&implementation.default_ref).to_string(),
  })
}
