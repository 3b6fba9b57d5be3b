//! Source selection and acquisition.
//!
//! Resolution ([`resolve_selection`]) is pure and runs before anything touches
//! the disk. Acquisition ([`Acquirer`]) then materializes the working tree and
//! captures its commit and dirty state.

pub mod acquire;
pub mod resolve;
mod types;
pub mod vcs;

pub use acquire::{AcquireError, Acquirer, inspect};
pub use resolve::{SelectionError, resolve_selection};
pub use types::{AcquiredSource, ResolvedSource, SourceDescriptor, SourceSelection, SourceType};
pub use vcs::{Git, SourceControl, VcsError, same_origin};
