use anyhow::{Result, ensure};
use std::path::PathBuf;
use std::sync::Arc;

use super::{Check, CheckInfo, Status, relative_path, walk_files};
use crate::gitignore::IgnoreMatcher;

/// Look for a substring in the relative paths of all non-ignored files,
/// e.g. `test` to require a test directory somewhere in the tree.
pub struct FilePathContainsCheck {
    info: CheckInfo,
    needle: String,
    root: PathBuf,
    ignore: Arc<IgnoreMatcher>,
    status_when_found: Status,
    status_when_not_found: Status,
    found: Vec<String>,
}

impl FilePathContainsCheck {
    /// `status_when_not_found` starts out as the check's `status_when_failed`
    pub fn new(
        info: CheckInfo,
        needle: impl Into<String>,
        root: impl Into<PathBuf>,
        ignore: Arc<IgnoreMatcher>,
    ) -> Self {
        let status_when_not_found = info.status_when_failed;
        Self {
            info,
            needle: needle.into(),
            root: root.into(),
            ignore,
            status_when_found: Status::Green,
            status_when_not_found,
            found: Vec::new(),
        }
    }

    pub fn status_when_found(mut self, status: Status) -> Self {
        self.status_when_found = status;
        self
    }

    pub fn status_when_not_found(mut self, status: Status) -> Self {
        self.status_when_not_found = status;
        self
    }

    pub fn found(&self) -> &[String] {
        &self.found
    }
}

impl Check for FilePathContainsCheck {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut CheckInfo {
        &mut self.info
    }

    fn run(&mut self) -> Result<()> {
        self.info.reset();

        ensure!(!self.needle.is_empty(), "Path search string for '{}' is empty", self.info.name);

        self.found = walk_files(&self.root)?
            .iter()
            .map(|file| relative_path(&self.root, file))
            .filter(|relative| relative.contains(&self.needle))
            .filter(|relative| !self.ignore.is_ignored(relative))
            .collect();

        self.info.status = if self.found.is_empty() {
            self.status_when_not_found
        } else {
            self.status_when_found
        };
        Ok(())
    }

    fn details(&self) -> Vec<String> {
        if self.found.is_empty() {
            return vec![format!("No file path contains {}.", self.needle)];
        }

        let mut lines = vec![format!("Found {} in paths:", self.needle)];
        lines.extend(self.found.iter().map(|path| format!("  {path}")));
        lines
    }
}
