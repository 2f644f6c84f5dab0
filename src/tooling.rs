//! Tooling
//!
//! Command-line surface over the directory backend.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
