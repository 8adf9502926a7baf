//! Check orchestration
//!
//! A [`Linter`] owns the checks registered for one repository snapshot. It runs
//! them on the worker pool, applies the override policy afterwards and derives
//! the exit status from the final statuses.

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::checks::{Check, Status};
use crate::exit_code;
use crate::parallel::{ExecutionStrategy, ParallelConfig};

pub mod report;

pub use report::{StatusSummary, truncate_block};

/// Report header data taken from the repository snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportHeader {
    pub repository: String,
    pub commit_count: usize,
    /// `Name <email>`, most active first
    pub contributors: Vec<String>,
}

impl std::fmt::Display for ReportHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Report for {}", self.repository)?;
        write!(f, "Commits: {}", self.commit_count)?;
        if self.contributors.is_empty() {
            write!(f, "\nContributors: none")?;
        } else {
            write!(f, "\nContributors:")?;
            for contributor in &self.contributors {
                write!(f, "\n  {contributor}")?;
            }
        }
        Ok(())
    }
}

/// Policy entry letting a named check fail without failing the run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckOverride {
    pub name: String,
    #[serde(default)]
    pub allowed_to_fail: bool,
}

pub struct Linter {
    header: ReportHeader,
    checks: Vec<Box<dyn Check>>,
    parallel: ParallelConfig,
    /// Line limit per rendered check, `None` when truncation is off
    max_lines: Option<usize>,
    has_run: bool,
}

impl Linter {
    pub fn new(header: ReportHeader) -> Self {
        Self {
            header,
            checks: Vec::new(),
            parallel: ParallelConfig::default(),
            max_lines: None,
            has_run: false,
        }
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_truncation(mut self, enabled: bool, max_lines: usize) -> Self {
        self.max_lines = enabled.then_some(max_lines);
        self
    }

    /// Register a check. Names must be unique so override entries resolve to one check.
    pub fn add_check(&mut self, check: Box<dyn Check>) -> Result<()> {
        if self.checks.iter().any(|existing| existing.name() == check.name()) {
            bail!("A check named '{}' is already registered", check.name());
        }
        self.has_run = false;
        self.checks.push(check);
        Ok(())
    }

    pub fn checks(&self) -> &[Box<dyn Check>] {
        &self.checks
    }

    pub fn header(&self) -> &ReportHeader {
        &self.header
    }

    /// Run every check and wait for all of them.
    ///
    /// On tool failure the first error in registration order is returned and
    /// the linter stays un-run, so the override policy and exit status cannot be derived.
    pub fn run(&mut self) -> Result<()> {
        self.has_run = false;

        let strategy = ExecutionStrategy::for_config(&self.parallel, self.checks.len());
        tracing::info!(
            "Running {} check(s) for {} ({:?})",
            self.checks.len(),
            self.header.repository,
            strategy
        );

        let outcomes = strategy.execute(self.checks.iter_mut().collect(), |check| -> Result<()> {
            check
                .run()
                .with_context(|| format!("Check '{}' could not be evaluated", check.name()))?;
            tracing::debug!("{} -> {}", check.name(), check.status());
            Ok(())
        })?;

        for outcome in outcomes {
            outcome?;
        }

        if let Some(unfinished) = self.checks.iter().find(|check| !check.status().is_evaluated()) {
            bail!("Check '{}' finished without a verdict", unfinished.name());
        }

        self.has_run = true;
        Ok(())
    }

    /// Downgrade Red to Yellow for checks whose policy allows failure.
    ///
    /// Returns the number of downgraded checks. Entries naming unknown checks are
    /// logged and skipped.
    pub fn apply_override_policy(&mut self, entries: &[CheckOverride]) -> Result<usize> {
        ensure!(self.has_run, "Override policy can only be applied after the checks have run");

        let mut downgraded = 0;
        for entry in entries {
            let Some(check) = self.checks.iter_mut().find(|check| check.name() == entry.name) else {
                tracing::warn!("Override for unknown check '{}' ignored", entry.name);
                continue;
            };

            if entry.allowed_to_fail && check.status() == Status::Red {
                let info = check.info_mut();
                info.status = Status::Yellow;
                info.notes
                    .push("Failure allowed by override policy, downgraded from red.".to_string());
                tracing::info!("Override: '{}' downgraded to yellow", entry.name);
                downgraded += 1;
            }
        }
        Ok(downgraded)
    }

    pub fn is_passing(&self) -> bool {
        !self.checks.iter().any(|check| check.status().is_failing())
    }

    /// [`exit_code::SUCCESS`] unless a check is Red, then [`exit_code::CHECKS_FAILED`]
    pub fn status_code(&self) -> i32 {
        if self.is_passing() {
            exit_code::SUCCESS
        } else {
            exit_code::CHECKS_FAILED
        }
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary::from_checks(&self.checks)
    }

    pub fn render_report(&self) -> String {
        report::render(&self.header, &self.checks, self.max_lines)
    }
}
