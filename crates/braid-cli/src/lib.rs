//! Braid command-line tool
//!
//! Loads a TOML type catalog plus mixin configuration and reports what the
//! mixin engine makes of it: mixin order, target class definitions and the
//! generated concrete types.

pub mod commands;
pub mod logging;
pub mod project;

pub use project::Project;
