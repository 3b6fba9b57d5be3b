//! Container image builds.
//!
//! # Submodules
//!
//! - [`execute`] - target planning and sequential build execution
//! - [`stage`] - scoped copies of entrypoint scripts into the build context
//! - [`tool`] - the [`ContainerBuilder`] seam and its command-line implementation

pub mod execute;
pub mod stage;
pub mod tool;

pub use execute::{BuildError, Executor, plan_targets};
pub use stage::{StageError, StagedFile};
pub use tool::{BuildRequest, BuildSecret, CommandBuilder, ContainerBuilder, ToolError};
