//! relaybuild-lib: build orchestration for relay implementations
//!
//! One `build` run resolves which source to use, materializes it, builds the
//! implementation's container images in order and records what was built:
//! - [`source`]: selection, cloning and inspection of source trees
//! - [`build`]: target planning and container builds
//! - [`provenance`]: the `.last-build.json` record
//! - [`pipeline`]: the end-to-end `build` operation

pub mod build;
pub mod config;
pub mod consts;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod provenance;
pub mod source;
pub mod util;
pub mod workspace_lock;

pub use error::{Error, ErrorKind, Result};
