//! Crate-level error type.
//!
//! Each subsystem has its own error enum; [`Error`] wraps them and maps every
//! failure onto the small set of kinds callers act on.

use thiserror::Error;

use crate::build::BuildError;
use crate::config::ConfigError;
use crate::provenance::ProvenanceError;
use crate::source::{AcquireError, SelectionError};
use crate::workspace_lock::WorkspaceLockError;

/// Broad classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Conflicting, missing or invalid options or configuration.
  Configuration,
  /// A `--local` path that does not exist.
  SourceNotFound,
  /// A target name outside the implementation's target set.
  UnknownTarget,
  /// The build tool (or staging for it) failed.
  Build,
  /// Anything else: version control, locking, I/O.
  Other,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Selection(#[from] SelectionError),

  #[error(transparent)]
  Acquire(#[from] AcquireError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Lock(#[from] WorkspaceLockError),

  #[error(transparent)]
  Provenance(#[from] ProvenanceError),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Config(_) | Error::Selection(_) => ErrorKind::Configuration,
      Error::Acquire(AcquireError::SourceNotFound(_)) => ErrorKind::SourceNotFound,
      Error::Build(BuildError::UnknownTarget { .. }) => ErrorKind::UnknownTarget,
      Error::Build(_) => ErrorKind::Build,
      Error::Acquire(_) | Error::Lock(_) | Error::Provenance(_) => ErrorKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
