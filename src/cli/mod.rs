//! Command-line interface for repolint
//!
//! clap argument parsing, styled console output and the `path` / `url` /
//! `batch` commands.

pub mod commands;
mod output;

pub use commands::Cli;
pub use output::Output;
