//! Adapter around the external secret-scanning process
//!
//! The scanner runs against the snapshot root and prints one JSON record per
//! finding on stdout. Its exit code is translated into a [`Status`]; anything
//! outside the documented protocol is a tool failure and comes back as `Err`.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::checks::Status;

/// Placeholder in `args` replaced by the scan target
pub const PATH_PLACEHOLDER: &str = "{path}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SecretScanConfig {
    /// Executable name (looked up on PATH) or path
    pub command: String,
    pub args: Vec<String>,
    /// Exit code the scanner uses to signal that secrets were found
    pub findings_exit_code: i32,
}

impl Default for SecretScanConfig {
    fn default() -> Self {
        Self {
            command: "trufflehog".to_string(),
            args: vec![
                "filesystem".to_string(),
                "--json".to_string(),
                "--results=verified,unknown".to_string(),
                "--fail".to_string(),
            ],
            findings_exit_code: 183,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretFinding {
    /// Path as reported by the scanner, relative to the snapshot root when it runs there
    pub file: String,
    pub line: u64,
    pub detector_description: String,
}

impl std::fmt::Display for SecretFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Found in {} at line {}",
            self.detector_description, self.file, self.line
        )
    }
}

#[derive(Debug, Clone)]
pub struct SecretScanReport {
    pub status: Status,
    pub findings: Vec<SecretFinding>,
}

// Scanner output records. Only the fields a finding needs are decoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScannerRecord {
    source_metadata: SourceMetadata,
    #[serde(default)]
    detector_description: Option<String>,
    #[serde(default)]
    detector_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceMetadata {
    data: SourceData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceData {
    filesystem: FilesystemLocation,
}

#[derive(Debug, Deserialize)]
struct FilesystemLocation {
    file: String,
    #[serde(default)]
    line: u64,
}

impl From<ScannerRecord> for SecretFinding {
    fn from(record: ScannerRecord) -> Self {
        let location = record.source_metadata.data.filesystem;
        let detector_description = record
            .detector_description
            .filter(|d| !d.is_empty())
            .or(record.detector_name)
            .unwrap_or_else(|| "Secret".to_string());

        Self {
            file: location.file,
            line: location.line,
            detector_description,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecretScanner {
    config: SecretScanConfig,
}

impl SecretScanner {
    pub fn new(config: SecretScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SecretScanConfig {
        &self.config
    }

    /// Arguments passed to the scanner; the target is always `.` because the
    /// process runs inside the snapshot root
    pub fn build_args(&self) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| {
                if arg.contains(PATH_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(PATH_PLACEHOLDER, ".")
                } else {
                    arg.clone()
                }
            })
            .collect();

        if !substituted {
            args.push(".".to_string());
        }
        args
    }

    fn resolve_command(&self) -> Result<PathBuf> {
        which::which(&self.config.command).with_context(|| {
            format!(
                "Secret scanner '{}' not found. Install it or set [secrets].command",
                self.config.command
            )
        })
    }

    /// Scan the snapshot at `root`
    pub fn scan(&self, root: &Path) -> Result<SecretScanReport> {
        let program = self.resolve_command()?;
        let args = self.build_args();

        tracing::info!(
            "Running secret scanner: {} {} in {}",
            program.display(),
            args.join(" "),
            root.display()
        );

        let output = Command::new(&program)
            .args(&args)
            .current_dir(root)
            .output()
            .with_context(|| format!("Failed to start secret scanner {}", program.display()))?;

        let code = output
            .status
            .code()
            .ok_or_else(|| anyhow!("Secret scanner {} was terminated by a signal", program.display()))?;
        tracing::debug!("Secret scanner exited with code {}", code);

        if code == 0 {
            return Ok(SecretScanReport {
                status: Status::Green,
                findings: Vec::new(),
            });
        }

        if code == self.config.findings_exit_code {
            let findings = parse_findings(&String::from_utf8_lossy(&output.stdout));
            tracing::debug!("Secret scanner reported {} finding(s)", findings.len());
            return Ok(SecretScanReport {
                status: Status::Red,
                findings,
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(anyhow!(
            "Secret scanner {} failed with exit code {}: {}",
            program.display(),
            code,
            stderr.trim()
        ))
    }
}

/// Decode line-delimited scanner output; lines that are not findings are skipped
pub fn parse_findings(stdout: &str) -> Vec<SecretFinding> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<ScannerRecord>(line) {
            Ok(record) => Some(SecretFinding::from(record)),
            Err(e) => {
                tracing::trace!("Skipping scanner output line: {}", e);
                None
            }
        })
        .collect()
}
