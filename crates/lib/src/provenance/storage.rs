//! Reading and writing `.last-build.json`.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the previous record, so readers see either the old or the new record.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use super::types::{ProvenanceError, ProvenanceRecord};

/// Atomically replace the record at `path`. Returns the JSON that was written.
pub fn write_record(record: &ProvenanceRecord, path: &Path) -> Result<String, ProvenanceError> {
  let json = record.to_json()?;
  let write_err = |source: io::Error| ProvenanceError::Write {
    path: path.to_path_buf(),
    source,
  };

  let dir = match path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => dir,
    _ => Path::new("."),
  };
  fs::create_dir_all(dir).map_err(write_err)?;

  let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
  temp.write_all(json.as_bytes()).map_err(write_err)?;
  temp.as_file().sync_all().map_err(write_err)?;
  temp.persist(path).map_err(|e| write_err(e.error))?;

  debug!(path = %path.display(), "wrote provenance record");
  Ok(json)
}

/// Load the record at `path`. Returns `Ok(None)` if there is none yet.
pub fn load_record(path: &Path) -> Result<Option<ProvenanceRecord>, ProvenanceError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => {
      return Err(ProvenanceError::Read {
        path: path.to_path_buf(),
        source: e,
      });
    }
  };

  serde_json::from_str(&content)
    .map(Some)
    .map_err(|e| ProvenanceError::Parse {
      path: path.to_path_buf(),
      source: e,
    })
}
