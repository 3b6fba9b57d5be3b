//! Temporary placement of entrypoint scripts inside a build context.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StageError {
  #[error("entrypoint script not found: {}", .0.display())]
  MissingSource(PathBuf),

  #[error("refusing to overwrite existing file {} in the build context", .0.display())]
  Conflict(PathBuf),

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A file copied into a build context. Removed when dropped.
#[derive(Debug)]
pub struct StagedFile {
  path: PathBuf,
}

impl StagedFile {
  /// Copy `source` into `dir` under its own file name.
  ///
  /// Returns `Ok(None)` when `source` already is that file. An identical copy
  /// left behind by an interrupted run is adopted and removed on drop like a
  /// fresh one; a file with different contents is never touched.
  pub fn stage(source: &Path, dir: &Path) -> Result<Option<Self>, StageError> {
    let Some(file_name) = source.file_name() else {
      return Err(StageError::MissingSource(source.to_path_buf()));
    };
    if !source.is_file() {
      return Err(StageError::MissingSource(source.to_path_buf()));
    }

    let dest = dir.join(file_name);
    if dest.exists() {
      if same_file(source, &dest) {
        debug!(path = %dest.display(), "entrypoint already in context");
        return Ok(None);
      }
      if same_contents(source, &dest) {
        debug!(path = %dest.display(), "adopting leftover staged entrypoint");
        return Ok(Some(Self { path: dest }));
      }
      return Err(StageError::Conflict(dest));
    }

    fs::copy(source, &dest).map_err(|e| StageError::Copy {
      from: source.to_path_buf(),
      to: dest.clone(),
      source: e,
    })?;
    debug!(path = %dest.display(), "staged entrypoint");

    Ok(Some(Self { path: dest }))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for StagedFile {
  fn drop(&mut self) {
    match fs::remove_file(&self.path) {
      Ok(()) => debug!(path = %self.path.display(), "removed staged entrypoint"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove staged entrypoint"),
    }
  }
}

fn same_file(a: &Path, b: &Path) -> bool {
  match (dunce::canonicalize(a), dunce::canonicalize(b)) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  }
}

fn same_contents(a: &Path, b: &Path) -> bool {
  match (fs::read(a), fs::read(b)) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  }
}
