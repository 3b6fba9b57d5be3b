//! Platform-specific directory locations.

pub mod paths;
