mod build;
mod last;
mod list;

use std::path::Path;

use anyhow::{Context, Result};
use relaybuild_lib::config::{Config, find_config_path};
use tracing::debug;

pub use build::cmd_build;
pub use last::cmd_last;
pub use list::cmd_list;

/// Locate and load `relaybuild.toml`.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
  let path = find_config_path(explicit)?;
  debug!(path = %path.display(), "loading config");
  Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}
