use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::cli::Output;
use crate::config::RepolintConfig;
use crate::runner::LintOutcome;

pub mod batch;
pub mod path;
pub mod url;

#[derive(Parser)]
#[command(
    name = "repolint",
    version = env!("CARGO_PKG_VERSION"),
    about = "Lint git repositories against compliance rules",
    long_about = "Repolint checks a repository for a README, a license, CI workflows, forbidden \
                  strings and leaked secrets, and reports a traffic-light verdict per rule.\n\n\
                  Exit codes: 0 all checks passed, 100 at least one check failed, 1 tool failure."
)]
pub struct Cli {
    /// Repository path, http(s) URL or batch file; the kind is detected automatically
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output except the reports
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Do not honour .gitignore and .repolintignore files
    #[arg(long, global = true)]
    pub ignore_gitignore: bool,

    /// Print check output in full
    #[arg(long, global = true)]
    pub disable_truncate: bool,

    /// Keep cloned repositories after linting
    #[arg(long, global = true)]
    pub disable_cleanup: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Lint a local repository
    Path(path::PathArgs),
    /// Clone and lint a remote repository
    Url(url::UrlArgs),
    /// Lint every path or URL listed in a file
    Batch(batch::BatchArgs),
}

impl Cli {
    pub async fn run(self) -> Result<i32> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);
        let config = RepolintConfig::load(self.config.as_deref(), Some(self.cli_overrides()))?;
        if let Some(path) = &self.config {
            output.verbose(&format!("Using configuration file {path}"));
        }

        let command = match (self.command, self.target) {
            (Some(_), Some(target)) => bail!("Unexpected target '{}' next to a subcommand", target),
            (Some(command), None) => command,
            (None, Some(target)) => detect_target(&target)?,
            (None, None) => bail!("No target given. Run 'repolint --help' for usage information"),
        };

        match command {
            Commands::Path(args) => path::execute(args, config, &output).await,
            Commands::Url(args) => url::execute(args, config, &output).await,
            Commands::Batch(args) => batch::execute(args, config, &output).await,
        }
    }

    /// Configuration keys set by flags; flags left off do not override lower layers
    pub fn cli_overrides(&self) -> serde_json::Value {
        let mut general = serde_json::Map::new();
        if self.ignore_gitignore {
            general.insert("gitignore".to_string(), false.into());
        }
        if self.disable_truncate {
            general.insert("truncate_output".to_string(), false.into());
        }
        if self.disable_cleanup {
            general.insert("cleanup".to_string(), false.into());
        }
        serde_json::json!({ "general": general })
    }
}

fn is_url(target: &str) -> bool {
    target.starts_with("https://") || target.starts_with("http://")
}

/// Pick the command for a bare target: URL, directory or batch file
pub fn detect_target(target: &str) -> Result<Commands> {
    if is_url(target) {
        return Ok(Commands::Url(url::UrlArgs {
            url: target.to_string(),
            save_dir: None,
        }));
    }

    let path = Path::new(target);
    if path.is_dir() {
        Ok(Commands::Path(path::PathArgs {
            dir: PathBuf::from(target),
        }))
    } else if path.is_file() {
        Ok(Commands::Batch(batch::BatchArgs {
            file: PathBuf::from(target),
        }))
    } else {
        bail!("'{}' is neither a URL, a directory nor a file", target)
    }
}

/// Print one lint outcome and hand back its exit code
fn present(outcome: LintOutcome, output: &Output) -> i32 {
    output.report(&outcome.report);
    output.verdict(outcome.exit_code, outcome.downgraded);
    outcome.exit_code
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // Keep ignore/globset quiet below -vvv
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => tracing_subscriber::EnvFilter::new("warn"),
        1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
        2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
