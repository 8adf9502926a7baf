//! Configuration for repolint
//!
//! Settings are layered with figment (see [`RepolintConfig::load`]) and
//! extracted into the typed structures below. The `rules` list is the check
//! catalogue; `overrides` is the policy applied after the checks have run.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::checks::Status;
use crate::linter::CheckOverride;
use crate::parallel::ParallelConfig;
use crate::secrets::SecretScanConfig;

pub mod core;
pub mod smart_load;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepolintConfig {
    pub general: GeneralConfig,
    pub parallel: ParallelConfig,
    pub secrets: SecretScanConfig,
    /// Built-in rules come from the embedded default configuration
    pub rules: Vec<RuleConfig>,
    pub overrides: Vec<CheckOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneralConfig {
    pub truncate_output: bool,
    pub max_lines: usize,
    /// Use .gitignore / .repolintignore in ignore-aware checks
    pub gitignore: bool,
    /// Additional ignore patterns anchored at the repository root
    pub ignore_patterns: Vec<String>,
    /// Remove cloned repositories after linting
    pub cleanup: bool,
    pub clone_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            truncate_output: true,
            max_lines: 10,
            gitignore: true,
            ignore_patterns: Vec::new(),
            cleanup: true,
            clone_dir: std::env::temp_dir().join("repolint").join("git"),
        }
    }
}

/// Fields every rule carries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleCommon {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fix: String,
    /// Status on violation; Red when unset
    #[serde(default)]
    pub status_when_failed: Option<Status>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_respect_ignore() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileExistsRule {
    #[serde(flatten)]
    pub common: RuleCommon,
    pub pattern: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub status_when_empty: Option<Status>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryExistsRule {
    #[serde(flatten)]
    pub common: RuleCommon,
    pub path: String,
    #[serde(default)]
    pub status_when_empty: Option<Status>,
    #[serde(default)]
    pub required_globs: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchForStringRule {
    #[serde(flatten)]
    pub common: RuleCommon,
    pub needle: String,
    #[serde(default)]
    pub invert_result: bool,
    #[serde(default = "default_respect_ignore")]
    pub respect_ignore: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilePathContainsRule {
    #[serde(flatten)]
    pub common: RuleCommon,
    pub needle: String,
    #[serde(default)]
    pub status_when_found: Option<Status>,
    #[serde(default)]
    pub status_when_not_found: Option<Status>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LicenseFileRule {
    #[serde(flatten)]
    pub common: RuleCommon,
    #[serde(default)]
    pub status_when_empty: Option<Status>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretsRule {
    #[serde(flatten)]
    pub common: RuleCommon,
}

/// One entry of the check catalogue, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    FileExists(FileExistsRule),
    DirectoryExists(DirectoryExistsRule),
    SearchForString(SearchForStringRule),
    FilePathContains(FilePathContainsRule),
    LicenseFile(LicenseFileRule),
    Secrets(SecretsRule),
}

impl RuleConfig {
    pub fn common(&self) -> &RuleCommon {
        match self {
            RuleConfig::FileExists(rule) => &rule.common,
            RuleConfig::DirectoryExists(rule) => &rule.common,
            RuleConfig::SearchForString(rule) => &rule.common,
            RuleConfig::FilePathContains(rule) => &rule.common,
            RuleConfig::LicenseFile(rule) => &rule.common,
            RuleConfig::Secrets(rule) => &rule.common,
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn is_enabled(&self) -> bool {
        self.common().enabled
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RuleConfig::FileExists(_) => "file_exists",
            RuleConfig::DirectoryExists(_) => "directory_exists",
            RuleConfig::SearchForString(_) => "search_for_string",
            RuleConfig::FilePathContains(_) => "file_path_contains",
            RuleConfig::LicenseFile(_) => "license_file",
            RuleConfig::Secrets(_) => "secrets",
        }
    }
}

impl RepolintConfig {
    pub fn enabled_rules(&self) -> impl Iterator<Item = &RuleConfig> {
        self.rules.iter().filter(|rule| rule.is_enabled())
    }

    /// Reject configurations the linter cannot run. Overrides naming unknown
    /// rules are only warned about.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.parallel.thread_percentage) {
            bail!(
                "parallel.thread_percentage must be between 1 and 100, got {}",
                self.parallel.thread_percentage
            );
        }

        let mut names = HashSet::new();
        for rule in &self.rules {
            let name = rule.name();
            if name.trim().is_empty() {
                bail!("A {} rule has an empty name", rule.kind());
            }
            if !names.insert(name) {
                bail!("Duplicate rule name '{}'", name);
            }

            match rule {
                RuleConfig::SearchForString(SearchForStringRule { needle, .. })
                | RuleConfig::FilePathContains(FilePathContainsRule { needle, .. })
                    if needle.is_empty() =>
                {
                    bail!("Rule '{}' needs a non-empty needle", name);
                }
                RuleConfig::FileExists(FileExistsRule { pattern, .. }) if pattern.is_empty() => {
                    bail!("Rule '{}' needs a non-empty pattern", name);
                }
                RuleConfig::DirectoryExists(DirectoryExistsRule { path, .. }) if path.is_empty() => {
                    bail!("Rule '{}' needs a non-empty path", name);
                }
                RuleConfig::Secrets(_) if rule.is_enabled() && self.secrets.command.is_empty() => {
                    bail!("Rule '{}' needs [secrets].command to be set", name);
                }
                _ => {}
            }
        }

        for entry in &self.overrides {
            if !names.contains(entry.name.as_str()) {
                tracing::warn!("Override '{}' does not match any configured rule", entry.name);
            }
        }

        Ok(())
    }
}
