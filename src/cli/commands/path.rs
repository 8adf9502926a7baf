use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::present;
use crate::cli::Output;
use crate::config::RepolintConfig;
use crate::git::RepositorySnapshot;
use crate::runner::{LintOutcome, LintRunner};

#[derive(Args, Debug, PartialEq)]
pub struct PathArgs {
    /// Directory of the git repository to lint
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

pub async fn execute(args: PathArgs, config: RepolintConfig, output: &Output) -> Result<i32> {
    let outcome = lint_path(args.dir, config).await?;
    Ok(present(outcome, output))
}

/// Lint a local repository on the blocking pool
pub(crate) async fn lint_path(dir: PathBuf, config: RepolintConfig) -> Result<LintOutcome> {
    tokio::task::spawn_blocking(move || {
        let snapshot = RepositorySnapshot::open(&dir)?;
        LintRunner::new(config).run(&snapshot)
    })
    .await
    .context("Lint task failed")?
}
