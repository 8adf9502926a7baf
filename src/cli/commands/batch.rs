use anyhow::{Context, Result, bail, ensure};
use clap::Args;
use std::path::PathBuf;

use super::{Commands, detect_target, path, present, url};
use crate::cli::Output;
use crate::config::RepolintConfig;
use crate::exit_code;
use crate::runner::LintOutcome;

#[derive(Args, Debug, PartialEq)]
pub struct BatchArgs {
    /// File listing one repository path or URL per line
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

pub async fn execute(args: BatchArgs, config: RepolintConfig, output: &Output) -> Result<i32> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read batch file {}", args.file.display()))?;

    let targets = parse_targets(&content);
    ensure!(!targets.is_empty(), "No targets listed in {}", args.file.display());

    let total = targets.len();
    let mut tally = BatchTally::default();

    for (index, target) in targets.into_iter().enumerate() {
        if index > 0 {
            output.separator();
        }
        output.header(&format!("[{}/{}] {}", index + 1, total, target));

        match lint_target(target, config.clone(), output).await {
            Ok(outcome) => tally.record(present(outcome, output)),
            Err(e) => {
                tracing::debug!("Tool failure on batch target {}: {:#}", target, e);
                output.error(&format!("{target}: {e:#}"));
                tally.record(exit_code::TOOL_FAILURE);
            }
        }
    }

    output.info(&tally.to_string());
    Ok(tally.exit_code())
}

/// Targets of a batch file: trimmed lines, blanks and `#` comments skipped
pub fn parse_targets(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

async fn lint_target(target: &str, config: RepolintConfig, output: &Output) -> Result<LintOutcome> {
    match detect_target(target)? {
        Commands::Path(args) => path::lint_path(args.dir, config).await,
        Commands::Url(args) => url::lint_url(args.url, config, output).await,
        Commands::Batch(_) => bail!("'{}' is a file; batch files cannot be nested", target),
    }
}

/// Per-target results of one batch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchTally {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl BatchTally {
    pub fn record(&mut self, code: i32) {
        match code {
            exit_code::SUCCESS => self.passed += 1,
            exit_code::CHECKS_FAILED => self.failed += 1,
            _ => self.errored += 1,
        }
    }

    /// Tool failures win over failed checks
    pub fn exit_code(&self) -> i32 {
        if self.errored > 0 {
            exit_code::TOOL_FAILURE
        } else if self.failed > 0 {
            exit_code::CHECKS_FAILED
        } else {
            exit_code::SUCCESS
        }
    }
}

impl std::fmt::Display for BatchTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Batch finished: {} passed, {} failed checks, {} could not be linted",
            self.passed, self.failed, self.errored
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets_skips_comments_and_blanks() {
        let content = "# repositories\n\n  ./one  \nhttps://example.com/two.git\n   # indented comment\n\t\n";
        assert_eq!(parse_targets(content), vec!["./one", "https://example.com/two.git"]);
        assert!(parse_targets("\n# nothing\n").is_empty());
    }

    #[test]
    fn test_tally_exit_code_precedence() {
        let mut tally = BatchTally::default();
        assert_eq!(tally.exit_code(), exit_code::SUCCESS);

        tally.record(exit_code::SUCCESS);
        assert_eq!(tally.exit_code(), exit_code::SUCCESS);

        tally.record(exit_code::CHECKS_FAILED);
        assert_eq!(tally.exit_code(), exit_code::CHECKS_FAILED);

        tally.record(exit_code::TOOL_FAILURE);
        tally.record(exit_code::SUCCESS);
        assert_eq!(tally.exit_code(), exit_code::TOOL_FAILURE);
        assert_eq!(
            tally,
            BatchTally {
                passed: 2,
                failed: 1,
                errored: 1
            }
        );
    }

    #[tokio::test]
    async fn test_nested_batch_file_is_rejected() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let nested = temp_dir.path().join("more.txt");
        std::fs::write(&nested, "./repo\n").unwrap();

        let output = Output::new(false, true);
        let result = lint_target(nested.to_str().unwrap(), RepolintConfig::default(), &output).await;
        assert!(result.unwrap_err().to_string().contains("cannot be nested"));
    }
}
