//! Version-control seam.
//!
//! Acquisition only talks to [`SourceControl`]. The production implementation,
//! [`Git`], mutates working trees by running the `git` program and inspects
//! them in-process with `gix`.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// A failed version-control command.
#[derive(Debug, Error)]
pub enum VcsError {
  #[error("failed to run '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("'{command}' exited with status {code:?}: {stderr}")]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// Operations acquisition needs from the version-control tool.
///
/// Mutating operations report failure. Inspection is best-effort and returns
/// `None` when the answer cannot be determined.
pub trait SourceControl {
  /// Clone `url` into `dest`, which must not exist yet.
  fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), VcsError>;

  /// Fetch updates from `origin` without touching the working tree.
  fn fetch(&self, repo: &Path) -> Result<(), VcsError>;

  /// Check out `git_ref` (branch, tag or commit).
  fn checkout(&self, repo: &Path, git_ref: &str) -> Result<(), VcsError>;

  /// Fast-forward the checked-out `git_ref` from its upstream.
  fn pull(&self, repo: &Path, git_ref: &str) -> Result<(), VcsError>;

  /// Fetch URL of the `origin` remote.
  fn origin_url(&self, repo: &Path) -> Option<String>;

  /// Full hash of the commit `HEAD` points at.
  fn head_commit(&self, path: &Path) -> Option<String>;

  /// Whether the working tree differs from `HEAD`.
  fn is_dirty(&self, path: &Path) -> Option<bool>;
}

/// [`SourceControl`] backed by the `git` executable and `gix`.
#[derive(Debug, Clone)]
pub struct Git {
  program: String,
}

impl Default for Git {
  fn default() -> Self {
    Self::new("git")
  }
}

impl Git {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
    }
  }

  fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String, VcsError> {
    let mut command = Command::new(&self.program);
    if let Some(cwd) = cwd {
      command.arg("-C").arg(cwd);
    }
    command
      .args(args)
      // Never block on a credential prompt.
      .env("GIT_TERMINAL_PROMPT", "0");

    let rendered = format!("{} {}", self.program, args.join(" "));
    debug!(command = %rendered, cwd = ?cwd, "running git");

    let output = command.output().map_err(|e| VcsError::Spawn {
      program: self.program.clone(),
      source: e,
    })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      return Err(VcsError::Failed {
        command: rendered,
        code: output.status.code(),
        stderr,
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

impl SourceControl for Git {
  fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), VcsError> {
    let dest = dest.to_string_lossy();
    self.run(None, &["clone", "--", url, dest.as_ref()]).map(drop)
  }

  fn fetch(&self, repo: &Path) -> Result<(), VcsError> {
    self.run(Some(repo), &["fetch", "--tags", "--force", "origin"]).map(drop)
  }

  fn checkout(&self, repo: &Path, git_ref: &str) -> Result<(), VcsError> {
    self.run(Some(repo), &["checkout", git_ref]).map(drop)
  }

  fn pull(&self, repo: &Path, git_ref: &str) -> Result<(), VcsError> {
    self.run(Some(repo), &["pull", "--ff-only", "origin", git_ref]).map(drop)
  }

  fn origin_url(&self, repo: &Path) -> Option<String> {
    let repo = gix::discover(repo).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    remote
      .url(gix::remote::Direction::Fetch)
      .map(|url| url.to_bstring().to_string())
  }

  fn head_commit(&self, path: &Path) -> Option<String> {
    let repo = gix::discover(path).ok()?;
    let id = repo.head_id().ok()?;
    Some(id.to_string())
  }

  fn is_dirty(&self, path: &Path) -> Option<bool> {
    let repo = gix::discover(path).ok()?;
    repo.is_dirty().ok()
  }
}

/// Whether two repository URLs name the same origin.
///
/// Ignores a trailing `/` and a trailing `.git`.
pub fn same_origin(a: &str, b: &str) -> bool {
  fn normalize(url: &str) -> &str {
    let url = url.trim().trim_end_matches('/');
    url.strip_suffix(".git").unwrap_or(url)
  }
  normalize(a) == normalize(b)
}
