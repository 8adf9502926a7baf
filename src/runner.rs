//! Lint pipeline for one repository snapshot
//!
//! Turns the configured rules into checks, runs them through the [`Linter`],
//! applies the override policy and renders the report.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::checks::{
    Check, CheckInfo, DirectoryExistsCheck, FileExistsCheck, FilePathContainsCheck,
    LicenseFileCheck, SearchForStringCheck, SecretsCheck,
};
use crate::config::{RepolintConfig, RuleCommon, RuleConfig};
use crate::git::RepositorySnapshot;
use crate::gitignore::IgnoreMatcher;
use crate::linter::{Linter, ReportHeader};
use crate::secrets::SecretScanner;

/// Result of linting one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOutcome {
    pub exit_code: i32,
    pub report: String,
    /// Checks downgraded by the override policy
    pub downgraded: usize,
}

pub struct LintRunner {
    config: RepolintConfig,
}

impl LintRunner {
    pub fn new(config: RepolintConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RepolintConfig {
        &self.config
    }

    /// Ignore matcher for a snapshot, or the disabled matcher when gitignore support is off
    pub fn ignore_matcher(&self, root: &Path) -> Result<IgnoreMatcher> {
        if !self.config.general.gitignore {
            return Ok(IgnoreMatcher::disabled());
        }
        IgnoreMatcher::load(root, &self.config.general.ignore_patterns)
            .with_context(|| format!("Failed to load ignore files in {}", root.display()))
    }

    /// One check per enabled rule, in configuration order
    pub fn build_checks(&self, root: &Path, ignore: &Arc<IgnoreMatcher>) -> Vec<Box<dyn Check>> {
        self.config
            .enabled_rules()
            .map(|rule| self.build_check(rule, root, ignore))
            .collect()
    }

    fn build_check(&self, rule: &RuleConfig, root: &Path, ignore: &Arc<IgnoreMatcher>) -> Box<dyn Check> {
        let info = check_info(rule.common());

        match rule {
            RuleConfig::FileExists(rule) => {
                let mut check = FileExistsCheck::new(info, &rule.pattern, root).recursive(rule.recursive);
                if let Some(status) = rule.status_when_empty {
                    check = check.status_when_empty(status);
                }
                Box::new(check)
            }
            RuleConfig::DirectoryExists(rule) => {
                let mut check = DirectoryExistsCheck::new(info, &rule.path, root)
                    .required_globs(rule.required_globs.clone())
                    .recursive(rule.recursive);
                if let Some(status) = rule.status_when_empty {
                    check = check.status_when_empty(status);
                }
                Box::new(check)
            }
            RuleConfig::SearchForString(rule) => Box::new(
                SearchForStringCheck::new(info, &rule.needle, root, Arc::clone(ignore))
                    .invert_result(rule.invert_result)
                    .respect_ignore(rule.respect_ignore),
            ),
            RuleConfig::FilePathContains(rule) => {
                let mut check = FilePathContainsCheck::new(info, &rule.needle, root, Arc::clone(ignore));
                if let Some(status) = rule.status_when_found {
                    check = check.status_when_found(status);
                }
                if let Some(status) = rule.status_when_not_found {
                    check = check.status_when_not_found(status);
                }
                Box::new(check)
            }
            RuleConfig::LicenseFile(rule) => {
                let mut check = LicenseFileCheck::new(info, root);
                if let Some(status) = rule.status_when_empty {
                    check = check.status_when_empty(status);
                }
                Box::new(check)
            }
            RuleConfig::Secrets(_) => Box::new(SecretsCheck::new(
                info,
                root,
                SecretScanner::new(self.config.secrets.clone()),
                Arc::clone(ignore),
            )),
        }
    }

    /// Lint the snapshot at `root` with an already collected report header
    pub fn run_at(&self, root: &Path, header: ReportHeader) -> Result<LintOutcome> {
        let ignore = Arc::new(self.ignore_matcher(root)?);

        let general = &self.config.general;
        let mut linter = Linter::new(header)
            .with_parallel(self.config.parallel)
            .with_truncation(general.truncate_output, general.max_lines);

        for check in self.build_checks(root, &ignore) {
            linter.add_check(check)?;
        }

        linter.run()?;
        let downgraded = linter.apply_override_policy(&self.config.overrides)?;

        let exit_code = linter.status_code();
        tracing::info!(
            "{}: {} (exit code {})",
            linter.header().repository,
            linter.summary(),
            exit_code
        );

        Ok(LintOutcome {
            exit_code,
            report: linter.render_report(),
            downgraded,
        })
    }

    pub fn run(&self, snapshot: &RepositorySnapshot) -> Result<LintOutcome> {
        let header = snapshot.header()?;
        self.run_at(snapshot.root(), header)
    }
}

fn check_info(common: &RuleCommon) -> CheckInfo {
    let info = CheckInfo::new(&common.name, &common.description, &common.fix);
    match common.status_when_failed {
        Some(status) => info.with_status_when_failed(status),
        None => info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Status;
    use crate::config::core::DEFAULT_CONFIG;
    use crate::config::{FileExistsRule, SearchForStringRule};
    use figment::Figment;
    use figment::providers::{Format, Toml};
    use crate::exit_code;
    use crate::linter::CheckOverride;
    use std::fs;
    use tempfile::TempDir;

    fn common(name: &str) -> RuleCommon {
        RuleCommon {
            name: name.to_string(),
            description: format!("{name} description"),
            fix: format!("{name} fix"),
            status_when_failed: None,
            enabled: true,
        }
    }

    fn config(rules: Vec<RuleConfig>, overrides: Vec<CheckOverride>) -> RepolintConfig {
        RepolintConfig {
            rules,
            overrides,
            ..RepolintConfig::default()
        }
    }

    fn readme_rule() -> RuleConfig {
        RuleConfig::FileExists(FileExistsRule {
            common: common("README exists"),
            pattern: "README.*".to_string(),
            recursive: false,
            status_when_empty: None,
        })
    }

    fn marker_rule() -> RuleConfig {
        RuleConfig::SearchForString(SearchForStringRule {
            common: common("No debug marker"),
            needle: "DO NOT MERGE".to_string(),
            invert_result: true,
            respect_ignore: true,
        })
    }

    #[test]
    fn test_passing_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# demo").unwrap();

        let runner = LintRunner::new(config(vec![readme_rule(), marker_rule()], Vec::new()));
        let outcome = runner.run_at(temp_dir.path(), ReportHeader::default()).unwrap();

        assert_eq!(outcome.exit_code, exit_code::SUCCESS);
        assert!(outcome.report.contains("✅   README exists"));
        assert!(outcome.report.contains("✅   No debug marker"));
    }

    #[test]
    fn test_failing_snapshot_and_override() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "DO NOT MERGE").unwrap();

        let strict = LintRunner::new(config(vec![readme_rule(), marker_rule()], Vec::new()));
        let outcome = strict.run_at(temp_dir.path(), ReportHeader::default()).unwrap();
        assert_eq!(outcome.exit_code, exit_code::CHECKS_FAILED);
        assert!(outcome.report.contains("README.md"));

        let lenient = LintRunner::new(config(
            vec![readme_rule(), marker_rule()],
            vec![CheckOverride {
                name: "No debug marker".to_string(),
                allowed_to_fail: true,
            }],
        ));
        let outcome = lenient.run_at(temp_dir.path(), ReportHeader::default()).unwrap();
        assert_eq!(outcome.exit_code, exit_code::SUCCESS);
        assert_eq!(outcome.downgraded, 1);
        assert!(outcome.report.contains("⚠️   No debug marker"));
    }

    #[test]
    fn test_gitignore_toggle() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# demo").unwrap();
        fs::write(temp_dir.path().join(".gitignore"), "scratch/\n").unwrap();
        fs::create_dir_all(temp_dir.path().join("scratch")).unwrap();
        fs::write(temp_dir.path().join("scratch/notes.txt"), "DO NOT MERGE").unwrap();

        let mut runner_config = config(vec![marker_rule()], Vec::new());
        let runner = LintRunner::new(runner_config.clone());
        assert_eq!(
            runner.run_at(temp_dir.path(), ReportHeader::default()).unwrap().exit_code,
            exit_code::SUCCESS
        );

        runner_config.general.gitignore = false;
        let runner = LintRunner::new(runner_config);
        assert_eq!(
            runner.run_at(temp_dir.path(), ReportHeader::default()).unwrap().exit_code,
            exit_code::CHECKS_FAILED
        );
    }

    fn default_workflow_rule_only() -> RepolintConfig {
        let mut defaults: RepolintConfig = Figment::from(Toml::string(DEFAULT_CONFIG)).extract().unwrap();
        defaults.rules.retain(|rule| rule.name() == "GitHub Workflow directory exists");
        assert_eq!(defaults.rules.len(), 1);
        defaults
    }

    #[test]
    fn test_default_workflow_rule_warns_on_partial_setup() {
        let runner = LintRunner::new(default_workflow_rule_only());
        let temp_dir = TempDir::new().unwrap();
        let workflows = temp_dir.path().join(".github/workflows");

        // missing
        let outcome = runner.run_at(temp_dir.path(), ReportHeader::default()).unwrap();
        assert_eq!(outcome.exit_code, exit_code::SUCCESS);
        assert!(outcome.report.contains("⚠️   GitHub Workflow directory exists"));

        // empty
        fs::create_dir_all(&workflows).unwrap();
        let outcome = runner.run_at(temp_dir.path(), ReportHeader::default()).unwrap();
        assert_eq!(outcome.exit_code, exit_code::SUCCESS);
        assert!(outcome.report.contains("⚠️   GitHub Workflow directory exists"));

        // no workflow files
        fs::write(workflows.join("README.md"), "docs").unwrap();
        let outcome = runner.run_at(temp_dir.path(), ReportHeader::default()).unwrap();
        assert_eq!(outcome.exit_code, exit_code::SUCCESS);
        assert!(outcome.report.contains("⚠️   GitHub Workflow directory exists"));

        fs::write(workflows.join("ci.yml"), "name: CI").unwrap();
        let outcome = runner.run_at(temp_dir.path(), ReportHeader::default()).unwrap();
        assert_eq!(outcome.exit_code, exit_code::SUCCESS);
        assert!(outcome.report.contains("✅   GitHub Workflow directory exists"));
    }

    #[test]
    fn test_disabled_and_lenient_rules() {
        let temp_dir = TempDir::new().unwrap();

        let mut disabled = readme_rule();
        if let RuleConfig::FileExists(rule) = &mut disabled {
            rule.common.enabled = false;
        }
        let mut lenient = marker_rule();
        if let RuleConfig::SearchForString(rule) = &mut lenient {
            rule.invert_result = false;
            rule.common.status_when_failed = Some(Status::Yellow);
        }

        let runner = LintRunner::new(config(vec![disabled, lenient], Vec::new()));
        let ignore = Arc::new(IgnoreMatcher::disabled());
        let checks = runner.build_checks(temp_dir.path(), &ignore);
        assert_eq!(checks.len(), 1);

        let outcome = runner.run_at(temp_dir.path(), ReportHeader::default()).unwrap();
        assert_eq!(outcome.exit_code, exit_code::SUCCESS);
        assert!(outcome.report.contains("⚠️   No debug marker"));
    }
}
