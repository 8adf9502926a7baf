//! # Repolint - compliance checks for git repositories
//!
//! Repolint inspects a repository against a configurable rule set (README,
//! license, CI workflows, forbidden strings, leaked secrets) and reports a
//! traffic-light verdict per rule plus an overall exit status.
//!
//! ## Quick Start
//!
//! ```bash
//! # Lint the current repository
//! repolint .
//!
//! # Lint a remote repository
//! repolint https://github.com/owner/project.git
//!
//! # Lint every target listed in a file
//! repolint batch repos.txt
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod git;
pub mod gitignore;
pub mod linter;
pub mod parallel;
pub mod runner;
pub mod secrets;

pub use checks::{Check, Status};
pub use cli::{Cli, Output};
pub use config::RepolintConfig;
pub use linter::Linter;
pub use runner::{LintOutcome, LintRunner};

/// Result type alias for repolint operations
pub type Result<T> = anyhow::Result<T>;

/// Process exit codes
pub mod exit_code {
    /// Every check passed after overrides
    pub const SUCCESS: i32 = 0;
    /// The verdict is unknown: a tool or infrastructure failure occurred
    pub const TOOL_FAILURE: i32 = 1;
    /// At least one check is red after overrides
    pub const CHECKS_FAILED: i32 = 100;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
