//! Value sources.
//!
//! Each layer applies one source to the registry, in this order:
//! - `file`: override files merged into the environment snapshot
//! - `env`: environment variables, by candidate name
//! - `cli`: command-line flags

pub mod cli;
pub mod env;
pub mod file;
