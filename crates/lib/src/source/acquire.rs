//! Materializing a working tree for a resolved source.
//!
//! # Workspace layout
//!
//! Git sources are cached at `{workspace}/{implementation}/` with their `.git`
//! directories intact so later runs can fetch instead of cloning. A cached
//! clone is only reused when its `origin` matches the requested repository;
//! anything else at that path is discarded and cloned again.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Implementation;
use crate::consts::{EMBEDDED_REF, LOCAL_REF, UNKNOWN_COMMIT};

use super::types::{AcquiredSource, ResolvedSource, SourceDescriptor, SourceType};
use super::vcs::{SourceControl, VcsError, same_origin};

/// Errors that can occur while acquiring a source tree.
#[derive(Debug, Error)]
pub enum AcquireError {
  /// The `--local` path is missing or not a directory.
  #[error("local source not found: {} does not exist or is not a directory", .0.display())]
  SourceNotFound(PathBuf),

  #[error("failed to create workspace directory '{}': {source}", path.display())]
  CreateWorkspace {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to discard stale clone at '{}': {source}", path.display())]
  RemoveStale {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: VcsError,
  },

  #[error("failed to fetch updates for '{}': {source}", path.display())]
  Fetch {
    path: PathBuf,
    #[source]
    source: VcsError,
  },

  #[error("failed to check out '{git_ref}': {source}")]
  Checkout {
    git_ref: String,
    #[source]
    source: VcsError,
  },
}

/// Acquires sources for one orchestrator.
pub struct Acquirer<'a> {
  vcs: &'a dyn SourceControl,
  workspace: &'a Path,
  orchestrator_root: &'a Path,
}

impl<'a> Acquirer<'a> {
  pub fn new(vcs: &'a dyn SourceControl, workspace: &'a Path, orchestrator_root: &'a Path) -> Self {
    Self {
      vcs,
      workspace,
      orchestrator_root,
    }
  }

  /// Produce a working tree and descriptor for `source`.
  pub fn acquire(&self, implementation: &Implementation, source: &ResolvedSource) -> Result<AcquiredSource, AcquireError> {
    match source {
      ResolvedSource::Git { repository, git_ref } => self.acquire_git(implementation, repository, git_ref),
      ResolvedSource::Local { path } => self.acquire_local(path),
      ResolvedSource::Embedded => Ok(self.acquire_embedded(implementation)),
    }
  }

  fn acquire_local(&self, path: &Path) -> Result<AcquiredSource, AcquireError> {
    if !path.is_dir() {
      return Err(AcquireError::SourceNotFound(path.to_path_buf()));
    }
    let tree = dunce::canonicalize(path).map_err(|_| AcquireError::SourceNotFound(path.to_path_buf()))?;

    let (commit, dirty) = inspect(self.vcs, &tree);
    debug!(path = %tree.display(), commit = %commit, dirty, "using local source");

    Ok(AcquiredSource {
      descriptor: SourceDescriptor {
        kind: SourceType::Local,
        repository: self.vcs.origin_url(&tree).unwrap_or_default(),
        git_ref: LOCAL_REF.to_string(),
        local_path: Some(tree.clone()),
        commit,
        dirty,
      },
      tree,
    })
  }

  fn acquire_embedded(&self, implementation: &Implementation) -> AcquiredSource {
    let (commit, dirty) = inspect(self.vcs, self.orchestrator_root);
    debug!(implementation = %implementation.name, commit = %commit, dirty, "using embedded source");

    AcquiredSource {
      descriptor: SourceDescriptor {
        kind: SourceType::Embedded,
        repository: self.vcs.origin_url(self.orchestrator_root).unwrap_or_default(),
        git_ref: EMBEDDED_REF.to_string(),
        local_path: None,
        commit,
        dirty,
      },
      tree: implementation.dir.clone(),
    }
  }

  fn acquire_git(
    &self,
    implementation: &Implementation,
    repository: &str,
    git_ref: &str,
  ) -> Result<AcquiredSource, AcquireError> {
    let repo_path = implementation.clone_dir(self.workspace);

    self.prepare_clone(&implementation.name, repository, &repo_path)?;

    self
      .vcs
      .checkout(&repo_path, git_ref)
      .map_err(|e| AcquireError::Checkout {
        git_ref: git_ref.to_string(),
        source: e,
      })?;

    // Tags and bare commits have no upstream to pull from.
    if let Err(e) = self.vcs.pull(&repo_path, git_ref) {
      warn!(git_ref, error = %e, "pull failed, building the checked-out revision");
    }

    let (commit, dirty) = inspect(self.vcs, &repo_path);
    info!(
      implementation = %implementation.name,
      git_ref,
      commit = %commit,
      "source ready"
    );

    Ok(AcquiredSource {
      descriptor: SourceDescriptor {
        kind: SourceType::Git,
        repository: repository.to_string(),
        git_ref: git_ref.to_string(),
        local_path: None,
        commit,
        dirty,
      },
      tree: repo_path,
    })
  }

  /// Ensure `repo_path` holds an up-to-date clone of `repository`.
  ///
  /// Reuses and fetches an existing clone with the same origin; discards
  /// anything else found at the path.
  fn prepare_clone(&self, name: &str, repository: &str, repo_path: &Path) -> Result<(), AcquireError> {
    if !self.workspace.exists() {
      fs::create_dir_all(self.workspace).map_err(|e| AcquireError::CreateWorkspace {
        path: self.workspace.to_path_buf(),
        source: e,
      })?;
    }

    if repo_path.join(".git").exists() {
      match self.vcs.origin_url(repo_path) {
        Some(origin) if same_origin(&origin, repository) => {
          debug!(name, path = %repo_path.display(), "fetching into existing clone");
          return self.vcs.fetch(repo_path).map_err(|e| AcquireError::Fetch {
            path: repo_path.to_path_buf(),
            source: e,
          });
        }
        origin => {
          info!(
            name,
            previous = origin.as_deref().unwrap_or("<none>"),
            repository,
            "origin changed, discarding cached clone"
          );
          remove_stale(repo_path)?;
        }
      }
    } else if repo_path.exists() {
      warn!(name, path = %repo_path.display(), "workspace entry is not a clone, discarding");
      remove_stale(repo_path)?;
    }

    info!(name, url = repository, path = %repo_path.display(), "cloning repository");
    self
      .vcs
      .clone_repo(repository, repo_path)
      .map_err(|e| AcquireError::Clone {
        url: repository.to_string(),
        source: e,
      })
  }
}

fn remove_stale(path: &Path) -> Result<(), AcquireError> {
  let result = if path.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  };
  result.map_err(|e| AcquireError::RemoveStale {
    path: path.to_path_buf(),
    source: e,
  })
}

/// Commit hash and dirty flag for `path`, falling back to `"unknown"`/false.
pub fn inspect(vcs: &dyn SourceControl, path: &Path) -> (String, bool) {
  let commit = match vcs.head_commit(path) {
    Some(commit) => commit,
    None => {
      warn!(path = %path.display(), "commit lookup failed, recording unknown");
      UNKNOWN_COMMIT.to_string()
    }
  };
  let dirty = vcs.is_dirty(path).unwrap_or(false);
  (commit, dirty)
}
