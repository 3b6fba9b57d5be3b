//! Container build tool seam.
//!
//! The build tool is an opaque command: it gets a build file, a context
//! directory, an image tag and optional secrets, and either succeeds or fails.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// A failed build tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
  #[error("failed to run '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("'{command}' exited with status {code:?}")]
  Failed { command: String, code: Option<i32> },
}

/// A file passed to the build as a secret mount rather than through the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSecret {
  pub id: String,
  pub path: PathBuf,
}

impl BuildSecret {
  /// `--secret` value understood by BuildKit.
  pub fn to_arg(&self) -> String {
    format!("id={},src={}", self.id, self.path.display())
  }
}

/// One image build.
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
  pub build_file: &'a Path,
  pub context: &'a Path,
  pub image: &'a str,
  pub secrets: &'a [BuildSecret],
}

/// Runs container builds. Blocks until the build finishes.
pub trait ContainerBuilder {
  fn build(&self, request: &BuildRequest<'_>) -> Result<(), ToolError>;
}

/// [`ContainerBuilder`] that shells out to a docker-compatible CLI.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
  program: String,
}

impl CommandBuilder {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
    }
  }

  fn args(request: &BuildRequest<'_>) -> Vec<String> {
    let mut args = vec![
      "build".to_string(),
      "--file".to_string(),
      request.build_file.display().to_string(),
      "--tag".to_string(),
      request.image.to_string(),
    ];
    for secret in request.secrets {
      args.push("--secret".to_string());
      args.push(secret.to_arg());
    }
    args.push(request.context.display().to_string());
    args
  }
}

impl ContainerBuilder for CommandBuilder {
  fn build(&self, request: &BuildRequest<'_>) -> Result<(), ToolError> {
    let args = Self::args(request);
    let rendered = format!("{} {}", self.program, args.join(" "));
    info!(image = request.image, "building image");
    debug!(command = %rendered, "spawning build tool");

    // Tool output goes to stderr: stdout is reserved for the provenance record.
    let status = Command::new(&self.program)
      .args(&args)
      .env("DOCKER_BUILDKIT", "1")
      .stdout(std::io::stderr())
      .status()
      .map_err(|e| ToolError::Spawn {
        program: self.program.clone(),
        source: e,
      })?;

    if !status.success() {
      return Err(ToolError::Failed {
        command: rendered,
        code: status.code(),
      });
    }
    Ok(())
  }
}
