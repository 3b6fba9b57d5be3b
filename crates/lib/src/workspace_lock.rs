//! Advisory locks on cached clones.
//!
//! A git-mode build holds an exclusive lock on `{workspace}/.{implementation}.lock`
//! from the first clone or fetch until its provenance record is written, so two
//! runs for the same implementation never race on the same tree.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub implementation: String,
}

#[derive(Debug, Error)]
pub enum WorkspaceLockError {
  #[error(
    "Workspace for '{implementation}' is locked by another process: {command} (PID {pid}, started {started_at})\n\
             If you're sure no relaybuild process is running, remove the lock file:\n  {}",
    lock_path.display()
  )]
  Contention {
    implementation: String,
    command: String,
    pid: u32,
    started_at: String,
    lock_path: PathBuf,
  },

  #[error(
    "Workspace is locked (could not read lock metadata)\n\
             If you're sure no relaybuild process is running, remove the lock file:\n  {}",
    lock_path.display()
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("Failed to create workspace directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("Failed to open lock file: {0}")]
  OpenFile(#[source] io::Error),

  #[error("Failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("Failed to acquire lock: {0}")]
  LockFailed(#[source] io::Error),
}

/// Exclusive lock on one implementation's cached clone. Released on drop.
pub struct WorkspaceLock {
  file: File,
  lock_path: PathBuf,
}

impl WorkspaceLock {
  pub fn lock_path_for(workspace: &Path, implementation: &str) -> PathBuf {
    workspace.join(format!(".{}.lock", implementation))
  }

  /// Take the lock without waiting; fails if another process holds it.
  pub fn acquire(workspace: &Path, implementation: &str, command: &str) -> Result<Self, WorkspaceLockError> {
    let lock_path = Self::lock_path_for(workspace, implementation);

    if !workspace.exists() {
      std::fs::create_dir_all(workspace).map_err(WorkspaceLockError::CreateDir)?;
    }

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(WorkspaceLockError::OpenFile)?;

    if let Err(err) = try_lock_exclusive(&file) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(Self::read_contention_error(&lock_path));
      }
      return Err(WorkspaceLockError::LockFailed(err));
    }

    Self::write_metadata(&file, command, implementation)?;

    Ok(WorkspaceLock { file, lock_path })
  }

  /// Reads the lock metadata from the held file handle.
  #[cfg(test)]
  fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Seek, SeekFrom};

    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  fn write_metadata(file: &File, command: &str, implementation: &str) -> Result<(), WorkspaceLockError> {
    let metadata = LockMetadata {
      version: 1,
      pid: std::process::id(),
      started_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
      command: command.to_string(),
      implementation: implementation.to_string(),
    };

    file.set_len(0).map_err(WorkspaceLockError::WriteMetadata)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &metadata)
      .map_err(|e| WorkspaceLockError::WriteMetadata(io::Error::other(e)))?;
    writer.flush().map_err(WorkspaceLockError::WriteMetadata)?;

    Ok(())
  }

  fn read_contention_error(lock_path: &Path) -> WorkspaceLockError {
    if let Ok(mut file) = File::open(lock_path) {
      let mut contents = String::new();
      if file.read_to_string(&mut contents).is_ok()
        && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
      {
        let started_at = chrono::DateTime::from_timestamp(metadata.started_at_unix as i64, 0)
          .map(|t| t.to_rfc3339())
          .unwrap_or_else(|| format!("Unix timestamp {}", metadata.started_at_unix));

        return WorkspaceLockError::Contention {
          implementation: metadata.implementation,
          command: metadata.command,
          pid: metadata.pid,
          started_at,
          lock_path: lock_path.to_path_buf(),
        };
      }
    }

    WorkspaceLockError::ContentionUnknown {
      lock_path: lock_path.to_path_buf(),
    }
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
