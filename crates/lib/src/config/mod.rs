//! Loading and validating `relaybuild.toml`.
//!
//! The directory containing the config file is the orchestrator root. All
//! relative paths in the file (implementation dirs, workspace, CA certificate)
//! are resolved against it; build files and entrypoints are resolved against
//! their implementation directory.

mod types;

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_FILENAME, DEFAULT_REF, ENV_CA_CERT, ENV_CONFIG, ENV_WORKSPACE};
use crate::platform::paths::{default_workspace_dir, expand_path};

pub use types::{Config, ConfigFile, Implementation, ImplementationDecl, SourceKind, Target, TargetDecl};

/// Errors raised while locating, parsing or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {path}")]
  NotFound { path: String },

  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: Box<toml::de::Error>,
  },

  #[error("implementation name must not be empty")]
  EmptyName,

  #[error("invalid implementation name '{0}': must be a single path component without '/', '\\', '.' or '..'")]
  InvalidName(String),

  #[error("implementation '{0}' is declared more than once")]
  DuplicateImplementation(String),

  #[error("implementation '{implementation}' declares target '{target}' more than once")]
  DuplicateTarget { implementation: String, target: String },

  #[error("implementation '{0}' declares no targets")]
  NoTargets(String),

  #[error("implementation '{0}' uses a git source but has no repository")]
  MissingRepository(String),

  #[error("implementation '{implementation}' lists unknown default target '{target}'")]
  UnknownDefaultTarget { implementation: String, target: String },

  #[error("unknown implementation '{name}' (known: {known})")]
  UnknownImplementation { name: String, known: String },
}

/// Locate the config file.
///
/// Resolution order: the explicit path, `RELAYBUILD_CONFIG`, then
/// `relaybuild.toml` in the current directory and each of its parents.
pub fn find_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
  if let Some(path) = explicit {
    if path.is_file() {
      return Ok(path.to_path_buf());
    }
    return Err(ConfigError::NotFound {
      path: path.display().to_string(),
    });
  }

  if let Some(env_path) = std::env::var_os(ENV_CONFIG) {
    let path = PathBuf::from(env_path);
    if path.is_file() {
      return Ok(path);
    }
    return Err(ConfigError::NotFound {
      path: path.display().to_string(),
    });
  }

  let cwd = std::env::current_dir().map_err(|e| ConfigError::Read {
    path: PathBuf::from("."),
    source: e,
  })?;

  for dir in cwd.ancestors() {
    let candidate = dir.join(CONFIG_FILENAME);
    if candidate.is_file() {
      return Ok(candidate);
    }
  }

  Err(ConfigError::NotFound {
    path: format!("{} (searched {} and its parents)", CONFIG_FILENAME, cwd.display()),
  })
}

impl Config {
  /// Read, parse and validate the config at `path`, then apply environment overrides.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;

    let canonical = dunce::canonicalize(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    let root = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

    let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: Box::new(e),
    })?;

    let mut config = Self::from_file(file, root)?;
    config.apply_env_overrides();

    debug!(
      root = %config.root.display(),
      workspace = %config.workspace.display(),
      implementations = config.implementations.len(),
      "loaded config"
    );
    Ok(config)
  }

  /// Build a validated config from a parsed document rooted at `root`.
  pub fn from_file(file: ConfigFile, root: PathBuf) -> Result<Self, ConfigError> {
    let workspace = match &file.workspace {
      Some(ws) => expand_path(ws, &root),
      None => default_workspace_dir(),
    };
    let ca_cert = file.ca_cert.as_deref().map(|p| expand_path(p, &root));

    let mut seen = HashSet::new();
    let mut implementations = Vec::with_capacity(file.implementations.len());

    for decl in file.implementations {
      if decl.name.trim().is_empty() {
        return Err(ConfigError::EmptyName);
      }
      if !is_plain_name(&decl.name) {
        return Err(ConfigError::InvalidName(decl.name));
      }
      if !seen.insert(decl.name.clone()) {
        return Err(ConfigError::DuplicateImplementation(decl.name));
      }
      implementations.push(resolve_implementation(decl, &root)?);
    }

    Ok(Config {
      root,
      workspace,
      build_tool: file.build_tool.unwrap_or_else(|| "docker".to_string()),
      git: file.git.unwrap_or_else(|| "git".to_string()),
      ca_cert,
      implementations,
    })
  }

  fn apply_env_overrides(&mut self) {
    if let Ok(ws) = std::env::var(ENV_WORKSPACE)
      && !ws.is_empty()
    {
      self.workspace = expand_path(&ws, &self.root);
    }
    if let Ok(cert) = std::env::var(ENV_CA_CERT)
      && !cert.is_empty()
    {
      self.ca_cert = Some(expand_path(&cert, &self.root));
    }
  }

  /// Look up an implementation by name.
  pub fn implementation(&self, name: &str) -> Result<&Implementation, ConfigError> {
    self
      .implementations
      .iter()
      .find(|i| i.name == name)
      .ok_or_else(|| ConfigError::UnknownImplementation {
        name: name.to_string(),
        known: self
          .implementations
          .iter()
          .map(|i| i.name.as_str())
          .collect::<Vec<_>>()
          .join(", "),
      })
  }
}

/// Whether `name` can be joined onto a directory without leaving it.
///
/// Names key the clone directory, the lock file and the default
/// implementation dir, so they must be exactly one normal path component.
fn is_plain_name(name: &str) -> bool {
  if name.contains(['/', '\\']) {
    return false;
  }
  let mut components = Path::new(name).components();
  matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

fn resolve_implementation(decl: ImplementationDecl, root: &Path) -> Result<Implementation, ConfigError> {
  let name = decl.name;

  if decl.targets.is_empty() {
    return Err(ConfigError::NoTargets(name));
  }

  let repository = decl.repository.filter(|r| !r.trim().is_empty());
  if decl.source == SourceKind::Git && repository.is_none() {
    return Err(ConfigError::MissingRepository(name));
  }

  let dir = expand_path(decl.dir.as_deref().unwrap_or(&name), root);

  let mut target_names = HashSet::new();
  let mut targets = Vec::with_capacity(decl.targets.len());
  for t in decl.targets {
    if !target_names.insert(t.name.clone()) {
      return Err(ConfigError::DuplicateTarget {
        implementation: name,
        target: t.name,
      });
    }
    targets.push(Target {
      build_file: dir.join(&t.build_file),
      entrypoint: t.entrypoint.map(|e| dir.join(e)),
      name: t.name,
      image: t.image,
    });
  }

  let default_targets = match decl.default_targets {
    Some(list) => {
      if let Some(unknown) = list.iter().find(|n| !target_names.contains(*n)) {
        return Err(ConfigError::UnknownDefaultTarget {
          implementation: name,
          target: unknown.clone(),
        });
      }
      list
    }
    None => targets.iter().map(|t| t.name.clone()).collect(),
  };

  Ok(Implementation {
    dir,
    source: decl.source,
    repository,
    default_ref: decl.default_ref.unwrap_or_else(|| DEFAULT_REF.to_string()),
    default_targets,
    targets,
    name,
  })
}
