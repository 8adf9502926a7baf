use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::present;
use crate::cli::Output;
use crate::config::RepolintConfig;
use crate::git::RepositorySnapshot;
use crate::runner::{LintOutcome, LintRunner};

#[derive(Args, Debug, PartialEq)]
pub struct UrlArgs {
    /// URL of the repository to clone
    #[arg(value_name = "URL")]
    pub url: String,

    /// Clone below this directory instead of `general.clone_dir`
    #[arg(value_name = "SAVE_DIR")]
    pub save_dir: Option<PathBuf>,
}

pub async fn execute(args: UrlArgs, mut config: RepolintConfig, output: &Output) -> Result<i32> {
    if let Some(save_dir) = args.save_dir {
        config.general.clone_dir = save_dir;
    }

    let outcome = lint_url(args.url, config, output).await?;
    Ok(present(outcome, output))
}

/// Clone and lint a remote repository; the clone is removed afterwards when cleanup is on
pub(crate) async fn lint_url(url: String, config: RepolintConfig, output: &Output) -> Result<LintOutcome> {
    let parent = config.general.clone_dir.clone();
    let cleanup = config.general.cleanup;
    output.info(&format!("Cloning {url} into {}", parent.display()));

    tokio::task::spawn_blocking(move || {
        let snapshot = RepositorySnapshot::clone_from(&url, &parent, cleanup)?;
        LintRunner::new(config).run(&snapshot)
    })
    .await
    .context("Lint task failed")?
}
