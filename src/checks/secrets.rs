use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Check, CheckInfo, Status, relative_path};
use crate::gitignore::IgnoreMatcher;
use crate::secrets::{SecretFinding, SecretScanner};

/// Run the external secret scanner and filter its findings through the ignore matcher.
///
/// Any finding outside ignored paths fails the check. When every finding sits
/// in an ignored file the check is downgraded to Yellow.
pub struct SecretsCheck {
    info: CheckInfo,
    root: PathBuf,
    scanner: SecretScanner,
    ignore: Arc<IgnoreMatcher>,
    findings: Vec<SecretFinding>,
    ignored_findings: Vec<SecretFinding>,
    note: Option<String>,
}

impl SecretsCheck {
    pub fn new(
        info: CheckInfo,
        root: impl Into<PathBuf>,
        scanner: SecretScanner,
        ignore: Arc<IgnoreMatcher>,
    ) -> Self {
        Self {
            info,
            root: root.into(),
            scanner,
            ignore,
            findings: Vec::new(),
            ignored_findings: Vec::new(),
            note: None,
        }
    }

    /// Findings outside ignored paths
    pub fn findings(&self) -> &[SecretFinding] {
        &self.findings
    }

    pub fn ignored_findings(&self) -> &[SecretFinding] {
        &self.ignored_findings
    }

    /// Scanner paths may be absolute or `./`-prefixed; the matcher wants root-relative
    fn finding_path(&self, file: &str) -> String {
        let path = Path::new(file);
        if path.is_absolute() {
            relative_path(&self.root, path)
        } else {
            relative_path(Path::new(""), path)
        }
    }
}

impl Check for SecretsCheck {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut CheckInfo {
        &mut self.info
    }

    fn run(&mut self) -> Result<()> {
        self.info.reset();
        self.findings.clear();
        self.ignored_findings.clear();
        self.note = None;

        let report = self.scanner.scan(&self.root)?;

        if report.status == Status::Green {
            self.info.status = Status::Green;
            return Ok(());
        }

        if report.findings.is_empty() {
            self.info.status = self.info.status_when_failed;
            self.note = Some("The scanner reported secrets but none of its output could be read.".to_string());
            return Ok(());
        }

        for finding in report.findings {
            if self.ignore.is_ignored(self.finding_path(&finding.file)) {
                self.ignored_findings.push(finding);
            } else {
                self.findings.push(finding);
            }
        }

        self.info.status = if self.findings.is_empty() {
            self.note = Some(
                "Caution: secrets were only found in ignored files. They will not be committed, but consider removing them.".to_string(),
            );
            Status::Yellow
        } else {
            self.info.status_when_failed
        };

        tracing::debug!(
            "{}: {} finding(s), {} in ignored files -> {}",
            self.info.name,
            self.findings.len(),
            self.ignored_findings.len(),
            self.info.status
        );
        Ok(())
    }

    fn details(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if !self.findings.is_empty() {
            lines.push("Secrets found:".to_string());
            lines.extend(self.findings.iter().map(|finding| format!("  {finding}")));
        }
        if !self.ignored_findings.is_empty() {
            lines.push("Secrets found in ignored files:".to_string());
            lines.extend(self.ignored_findings.iter().map(|finding| format!("  {finding}")));
        }
        lines.extend(self.note.iter().cloned());

        lines
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::secrets::SecretScanConfig;
    use std::fs;
    use tempfile::TempDir;

    fn info() -> CheckInfo {
        CheckInfo::new("No secrets", "Scan for leaked secrets", "Remove the secrets.")
    }

    fn record(file: &str) -> String {
        format!(
            r#"{{"SourceMetadata":{{"Data":{{"Filesystem":{{"file":"{file}","line":1}}}}}},"DetectorName":"Generic","DetectorDescription":"Generic API key"}}"#
        )
    }

    /// Scanner stand-in living outside the scanned tree
    fn scanner(script_dir: &Path, stdout: &str, exit_code: i32) -> SecretScanner {
        let script = script_dir.join("scanner.sh");
        fs::write(
            &script,
            format!("#!/bin/sh\ncat <<'EOF'\n{stdout}\nEOF\nexit {exit_code}\n"),
        )
        .unwrap();

        SecretScanner::new(SecretScanConfig {
            command: "sh".to_string(),
            args: vec![script.display().to_string()],
            findings_exit_code: 183,
        })
    }

    fn repo_with_ignore(patterns: &str) -> (TempDir, Arc<IgnoreMatcher>) {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join(".gitignore"), patterns).unwrap();
        fs::write(repo.path().join(".env"), "KEY=abc").unwrap();
        fs::write(repo.path().join("main.py"), "key = 'abc'").unwrap();
        let ignore = Arc::new(IgnoreMatcher::load(repo.path(), &[]).unwrap());
        (repo, ignore)
    }

    #[test]
    fn test_clean_scan_is_green() {
        let tools = TempDir::new().unwrap();
        let (repo, ignore) = repo_with_ignore("");

        let mut check = SecretsCheck::new(info(), repo.path(), scanner(tools.path(), "", 0), ignore);
        check.run().unwrap();

        assert_eq!(check.status(), Status::Green);
        assert!(check.findings().is_empty());
    }

    #[test]
    fn test_unignored_secret_is_red() {
        let tools = TempDir::new().unwrap();
        let (repo, ignore) = repo_with_ignore("");

        let mut check = SecretsCheck::new(
            info(),
            repo.path(),
            scanner(tools.path(), &record(".env"), 183),
            ignore,
        );
        check.run().unwrap();

        assert_eq!(check.status(), Status::Red);
        assert_eq!(check.findings().len(), 1);
        assert!(check.render().contains("Generic API key Found in .env at line 1"));
    }

    #[test]
    fn test_secret_in_ignored_file_is_yellow() {
        let tools = TempDir::new().unwrap();
        let (repo, ignore) = repo_with_ignore(".env\n");

        let mut check = SecretsCheck::new(
            info(),
            repo.path(),
            scanner(tools.path(), &record("./.env"), 183),
            ignore,
        );
        check.run().unwrap();

        assert_eq!(check.status(), Status::Yellow);
        assert!(check.findings().is_empty());
        assert_eq!(check.ignored_findings().len(), 1);
        assert!(check.render().contains("Caution"));
    }

    #[test]
    fn test_mixed_findings_stay_red() {
        let tools = TempDir::new().unwrap();
        let (repo, ignore) = repo_with_ignore(".env\n");
        let stdout = format!("{}\n{}", record(".env"), record("main.py"));

        let mut check = SecretsCheck::new(
            info(),
            repo.path(),
            scanner(tools.path(), &stdout, 183),
            ignore,
        );
        check.run().unwrap();

        assert_eq!(check.status(), Status::Red);
        assert_eq!(check.findings().len(), 1);
        assert_eq!(check.ignored_findings().len(), 1);
    }

    #[test]
    fn test_absolute_finding_paths_are_matched() {
        let tools = TempDir::new().unwrap();
        let (repo, ignore) = repo_with_ignore(".env\n");
        let absolute = repo.path().join(".env").display().to_string();

        let mut check = SecretsCheck::new(
            info(),
            repo.path(),
            scanner(tools.path(), &record(&absolute), 183),
            ignore,
        );
        check.run().unwrap();

        assert_eq!(check.status(), Status::Yellow);
    }

    #[test]
    fn test_scanner_failure_propagates() {
        let tools = TempDir::new().unwrap();
        let (repo, ignore) = repo_with_ignore("");

        let mut check = SecretsCheck::new(info(), repo.path(), scanner(tools.path(), "", 1), ignore);
        assert!(check.run().is_err());
        assert_eq!(check.status(), Status::Gray);
    }
}
