use std::path::PathBuf;

use crate::consts::APP_NAME;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var_os("USERPROFILE").map(PathBuf::from).unwrap_or_default()
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default()
}

/// Returns the directory for cache files for the application
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  let local_appdata = std::env::var_os("LOCALAPPDATA").map(PathBuf::from).unwrap_or_default();
  local_appdata.join(APP_NAME).join("Cache")
}

/// Returns the directory for cache files for the application
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Default location of cached clones when the config does not name one.
pub fn default_workspace_dir() -> PathBuf {
  cache_dir().join("sources")
}

/// Expands a leading `~` and resolves relative paths against `base`.
///
/// Does not touch the filesystem.
pub fn expand_path(path: &str, base: &std::path::Path) -> PathBuf {
  if let Some(rest) = path.strip_prefix("~/") {
    home_dir().join(rest)
  } else if path == "~" {
    home_dir()
  } else {
    let p = PathBuf::from(path);
    if p.is_absolute() { p } else { base.join(p) }
  }
}
