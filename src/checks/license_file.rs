use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

use super::{Check, CheckInfo, Status, relative_path};

const LICENSE_PATTERN: &str = "LICENSE*";

/// Look for a `LICENSE*` file at the repository root.
///
/// Repositories that keep their licenses in a `LICENSE*` directory are accepted
/// too: the first `LICENSE*` file inside it decides the verdict.
pub struct LicenseFileCheck {
    info: CheckInfo,
    root: PathBuf,
    status_when_empty: Status,
    matches: Vec<PathBuf>,
    note: Option<String>,
}

impl LicenseFileCheck {
    pub fn new(info: CheckInfo, root: impl Into<PathBuf>) -> Self {
        Self {
            info,
            root: root.into(),
            status_when_empty: Status::Red,
            matches: Vec::new(),
            note: None,
        }
    }

    pub fn status_when_empty(mut self, status: Status) -> Self {
        self.status_when_empty = status;
        self
    }

    fn entries(dir: &Path, matcher: &GlobMatcher, want_dirs: bool) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in
            fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?
        {
            let path = entry?.path();
            let kind_matches = if want_dirs { path.is_dir() } else { path.is_file() };
            if kind_matches && path.file_name().is_some_and(|name| matcher.is_match(name)) {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    fn is_empty_file(path: &Path) -> Result<bool> {
        Ok(fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len()
            == 0)
    }

    fn judge_single(&mut self, file: &Path) -> Result<Status> {
        if Self::is_empty_file(file)? {
            self.note = Some(format!(
                "License file {} is empty.",
                relative_path(&self.root, file)
            ));
            Ok(self.status_when_empty)
        } else {
            Ok(Status::Green)
        }
    }
}

impl Check for LicenseFileCheck {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut CheckInfo {
        &mut self.info
    }

    fn run(&mut self) -> Result<()> {
        self.info.reset();
        self.note = None;

        let matcher = GlobBuilder::new(LICENSE_PATTERN)
            .case_insensitive(true)
            .build()?
            .compile_matcher();

        let mut matches = Self::entries(&self.root, &matcher, false)?;
        // Fall back to the first file of a LICENSE* directory
        if matches.is_empty()
            && let Some(directory) = Self::entries(&self.root, &matcher, true)?.first()
        {
            matches.extend(Self::entries(directory, &matcher, false)?.into_iter().take(1));
        }

        self.info.status = match matches.as_slice() {
            [single] => self.judge_single(single)?,
            [] => {
                self.note = Some("License file not found.".to_string());
                self.info.status_when_failed
            }
            _ => Status::Yellow,
        };
        self.matches = matches;
        Ok(())
    }

    fn details(&self) -> Vec<String> {
        if self.matches.len() > 1 {
            let mut lines = vec!["Multiple license files found:".to_string()];
            lines.extend(
                self.matches
                    .iter()
                    .map(|path| format!("  {}", relative_path(&self.root, path))),
            );
            return lines;
        }
        self.note.iter().cloned().collect()
    }
}
