//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Orchestrator layout used by every test: an embedded `reference`
/// implementation and a git-sourced `quiche` implementation.
const CONFIG: &str = r#"
build_tool = "BUILD_TOOL"

[[implementation]]
name = "reference"
dir = "impls/reference"
source = "embedded"

[[implementation.target]]
name = "relay"
build_file = "Dockerfile.relay"
image = "reference-relay:latest"

[[implementation.target]]
name = "client"
build_file = "Dockerfile.client"
image = "reference-client:latest"

[[implementation]]
name = "quiche"
dir = "impls/quiche"
repository = "https://example.com/quiche.git"
default_ref = "master"

[[implementation.target]]
name = "relay"
build_file = "Dockerfile.relay"
image = "quiche-relay:latest"
entrypoint = "entrypoint.sh"

[[implementation.target]]
name = "client"
build_file = "Dockerfile.client"
image = "quiche-client:latest"
"#;

/// Stand-in for `docker`: logs its arguments, plus the context listing, and
/// fails when asked to tag `$FAKE_BUILD_FAIL`.
#[cfg(unix)]
const FAKE_BUILD_TOOL: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_BUILD_LOG"
for arg in "$@"; do
  context="$arg"
  if [ -n "$FAKE_BUILD_FAIL" ] && [ "$arg" = "$FAKE_BUILD_FAIL" ]; then
    echo "build failed" >&2
    exit 1
  fi
done
ls -A "$context" | tr '\n' ' ' >> "$FAKE_BUILD_LOG"
echo >> "$FAKE_BUILD_LOG"
"#;

/// Isolated orchestrator checkout with its own workspace and build log.
pub struct TestEnv {
  pub temp: TempDir,
  pub root: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("orchestrator");
    std::fs::create_dir_all(&root).unwrap();
    let root = dunce::canonicalize(&root).unwrap_or(root);

    let tool = temp.path().join("fake-docker");
    write_build_tool(&tool);

    let config = CONFIG.replace("BUILD_TOOL", &tool.display().to_string());
    std::fs::write(root.join("relaybuild.toml"), config).unwrap();

    let env = Self { temp, root };
    for name in ["reference", "quiche"] {
      env.write_file(&format!("impls/{}/Dockerfile.relay", name), "FROM scratch\n");
      env.write_file(&format!("impls/{}/Dockerfile.client", name), "FROM scratch\n");
    }
    env.write_file("impls/quiche/entrypoint.sh", "#!/bin/sh\nexec quiche-server \"$@\"\n");
    env
  }

  /// Write a file relative to the orchestrator root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root.join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// A directory outside the orchestrator, e.g. a developer checkout.
  pub fn outside_dir(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn workspace(&self) -> PathBuf {
    self.temp.path().join("workspace")
  }

  pub fn provenance_path(&self, implementation: &str) -> PathBuf {
    self.root.join("impls").join(implementation).join(".last-build.json")
  }

  /// Lines written by the stand-in build tool, one argument line and one
  /// context listing per build.
  pub fn build_log(&self) -> Vec<String> {
    std::fs::read_to_string(self.log_path())
      .map(|s| s.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }

  fn log_path(&self) -> PathBuf {
    self.temp.path().join("build.log")
  }

  /// Get a pre-configured Command for the relaybuild binary.
  ///
  /// Runs from the orchestrator root and sets:
  /// - `RELAYBUILD_WORKSPACE`: isolated clone cache
  /// - `FAKE_BUILD_LOG`: where the stand-in build tool logs
  pub fn relaybuild_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("relaybuild");
    cmd.current_dir(&self.root);
    cmd.env_remove("RELAYBUILD_CONFIG");
    cmd.env_remove("RELAYBUILD_CA_CERT");
    cmd.env("RELAYBUILD_WORKSPACE", self.workspace());
    cmd.env("FAKE_BUILD_LOG", self.log_path());
    cmd.env_remove("FAKE_BUILD_FAIL");
    cmd
  }
}

#[cfg(unix)]
fn write_build_tool(path: &Path) {
  use std::os::unix::fs::PermissionsExt;

  std::fs::write(path, FAKE_BUILD_TOOL).unwrap();
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn write_build_tool(path: &Path) {
  std::fs::write(path, "").unwrap();
}

/// Parse command stdout as JSON.
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
  serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
    panic!(
      "stdout is not JSON ({}): {}",
      e,
      String::from_utf8_lossy(&output.stdout)
    )
  })
}
