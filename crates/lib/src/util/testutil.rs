//! Test doubles for the version-control and container-build seams.
//!
//! [`FakeVcs`] keeps its state on disk inside `.git/` of the trees it
//! "clones", so tests can inspect and tamper with working trees the same way
//! acquisition does.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::build::{BuildRequest, ContainerBuilder, ToolError};
use crate::config::{Implementation, SourceKind, Target};
use crate::source::{SourceControl, VcsError};

fn failed(command: String) -> VcsError {
  VcsError::Failed {
    command,
    code: Some(1),
    stderr: "fake failure".to_string(),
  }
}

/// In-memory upstreams plus on-disk fake clones.
#[derive(Default)]
pub struct FakeVcs {
  upstreams: RefCell<HashMap<String, String>>,
  calls: RefCell<Vec<String>>,
  fail_pull: Cell<bool>,
  fail_checkout: Cell<bool>,
  hide_commits: Cell<bool>,
}

impl FakeVcs {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare a reachable upstream whose default branch points at `commit`.
  pub fn set_upstream(&self, url: &str, commit: &str) {
    self.upstreams.borrow_mut().insert(url.to_string(), commit.to_string());
  }

  pub fn fail_pull(&self) {
    self.fail_pull.set(true);
  }

  pub fn fail_checkout(&self) {
    self.fail_checkout.set(true);
  }

  /// Make every commit lookup fail.
  pub fn hide_commits(&self) {
    self.hide_commits.set(true);
  }

  /// Turn `path` into a fake repository.
  pub fn init_repo(&self, path: &Path, origin: &str, commit: &str, dirty: bool) {
    let git = path.join(".git");
    fs::create_dir_all(&git).unwrap();
    fs::write(git.join("origin"), origin).unwrap();
    fs::write(git.join("HEAD"), commit).unwrap();
    if dirty {
      fs::write(git.join("DIRTY"), "").unwrap();
    }
  }

  /// Mutating calls in order, e.g. `"clone <url>"`, `"checkout main"`.
  pub fn calls(&self) -> Vec<String> {
    self.calls.borrow().clone()
  }

  pub fn count(&self, prefix: &str) -> usize {
    self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
  }

  fn record(&self, call: String) {
    self.calls.borrow_mut().push(call);
  }
}

impl SourceControl for FakeVcs {
  fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), VcsError> {
    self.record(format!("clone {}", url));
    let commit = self
      .upstreams
      .borrow()
      .get(url)
      .cloned()
      .ok_or_else(|| failed(format!("git clone {}", url)))?;
    self.init_repo(dest, url, &commit, false);
    fs::write(dest.join("README"), url).unwrap();
    Ok(())
  }

  fn fetch(&self, repo: &Path) -> Result<(), VcsError> {
    self.record("fetch".to_string());
    if repo.join(".git").exists() {
      Ok(())
    } else {
      Err(failed("git fetch".to_string()))
    }
  }

  fn checkout(&self, _repo: &Path, git_ref: &str) -> Result<(), VcsError> {
    self.record(format!("checkout {}", git_ref));
    if self.fail_checkout.get() {
      return Err(failed(format!("git checkout {}", git_ref)));
    }
    Ok(())
  }

  fn pull(&self, repo: &Path, git_ref: &str) -> Result<(), VcsError> {
    self.record(format!("pull {}", git_ref));
    if self.fail_pull.get() {
      return Err(failed(format!("git pull origin {}", git_ref)));
    }
    if let Some(origin) = self.origin_url(repo)
      && let Some(commit) = self.upstreams.borrow().get(&origin)
    {
      fs::write(repo.join(".git").join("HEAD"), commit).unwrap();
    }
    Ok(())
  }

  fn origin_url(&self, repo: &Path) -> Option<String> {
    fs::read_to_string(repo.join(".git").join("origin")).ok()
  }

  fn head_commit(&self, path: &Path) -> Option<String> {
    if self.hide_commits.get() {
      return None;
    }
    fs::read_to_string(path.join(".git").join("HEAD")).ok()
  }

  fn is_dirty(&self, path: &Path) -> Option<bool> {
    let git = path.join(".git");
    if git.exists() {
      Some(git.join("DIRTY").exists())
    } else {
      None
    }
  }
}

/// What a [`RecordingBuilder`] saw for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBuild {
  pub image: String,
  pub build_file: PathBuf,
  pub context: PathBuf,
  pub secrets: Vec<String>,
  /// File names present in the context while the build ran.
  pub context_files: Vec<String>,
}

/// Container builder that records requests and optionally fails one image.
#[derive(Default)]
pub struct RecordingBuilder {
  builds: RefCell<Vec<RecordedBuild>>,
  fail_image: RefCell<Option<String>>,
}

impl RecordingBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_on(&self, image: &str) {
    *self.fail_image.borrow_mut() = Some(image.to_string());
  }

  pub fn builds(&self) -> Vec<RecordedBuild> {
    self.builds.borrow().clone()
  }
}

impl ContainerBuilder for RecordingBuilder {
  fn build(&self, request: &BuildRequest<'_>) -> Result<(), ToolError> {
    let mut context_files: Vec<String> = fs::read_dir(request.context)
      .map(|entries| {
        entries
          .flatten()
          .map(|e| e.file_name().to_string_lossy().into_owned())
          .collect()
      })
      .unwrap_or_default();
    context_files.sort();

    self.builds.borrow_mut().push(RecordedBuild {
      image: request.image.to_string(),
      build_file: request.build_file.to_path_buf(),
      context: request.context.to_path_buf(),
      secrets: request.secrets.iter().map(|s| s.to_arg()).collect(),
      context_files,
    });

    if self.fail_image.borrow().as_deref() == Some(request.image) {
      return Err(ToolError::Failed {
        command: format!("fake build {}", request.image),
        code: Some(1),
      });
    }
    Ok(())
  }
}

fn target(dir: &Path, name: &str, implementation: &str, entrypoint: bool) -> Target {
  Target {
    name: name.to_string(),
    build_file: dir.join(format!("Dockerfile.{}", name)),
    image: format!("{}-{}:test", implementation, name),
    entrypoint: entrypoint.then(|| dir.join(format!("entrypoint-{}.sh", name))),
  }
}

/// Git implementation with targets `relay` (with entrypoint) and `client`.
pub fn git_implementation(name: &str, dir: PathBuf) -> Implementation {
  Implementation {
    name: name.to_string(),
    source: SourceKind::Git,
    repository: Some(format!("https://example.com/{}.git", name)),
    default_ref: "main".to_string(),
    default_targets: vec!["relay".to_string(), "client".to_string()],
    targets: vec![target(&dir, "relay", name, true), target(&dir, "client", name, false)],
    dir,
  }
}

/// Embedded implementation with targets `relay` and `client`, no entrypoints.
pub fn embedded_implementation(name: &str, dir: PathBuf) -> Implementation {
  Implementation {
    name: name.to_string(),
    source: SourceKind::Embedded,
    repository: None,
    default_ref: "main".to_string(),
    default_targets: vec!["relay".to_string(), "client".to_string()],
    targets: vec![target(&dir, "relay", name, false), target(&dir, "client", name, false)],
    dir,
  }
}
