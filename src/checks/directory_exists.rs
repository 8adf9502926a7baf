use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::PathBuf;

use super::{Check, CheckInfo, Status, relative_path, walk_files};

/// Check that a directory exists and is not empty.
///
/// An existing directory without entries takes `status_when_empty`, which
/// defaults to Red. With `required_globs`, the directory must also hold at
/// least one file matching any of them, otherwise `status_when_empty` applies too.
pub struct DirectoryExistsCheck {
    info: CheckInfo,
    path: String,
    root: PathBuf,
    status_when_empty: Status,
    required_globs: Vec<String>,
    recursive: bool,
    note: Option<String>,
}

impl DirectoryExistsCheck {
    pub fn new(info: CheckInfo, path: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            info,
            path: path.into(),
            root: root.into(),
            status_when_empty: Status::Red,
            required_globs: Vec::new(),
            recursive: false,
            note: None,
        }
    }

    pub fn status_when_empty(mut self, status: Status) -> Self {
        self.status_when_empty = status;
        self
    }

    /// Require at least one file matching any of `globs`
    pub fn required_globs(mut self, globs: Vec<String>) -> Self {
        self.required_globs = globs;
        self
    }

    /// Look for `required_globs` matches in subdirectories too
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    fn build_globset(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.required_globs {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid required glob '{pattern}'"))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    fn has_required_file(&self, directory: &std::path::Path) -> Result<bool> {
        let globs = self.build_globset()?;

        let files = if self.recursive {
            walk_files(directory)?
        } else {
            let mut files = Vec::new();
            for entry in fs::read_dir(directory)
                .with_context(|| format!("Failed to read directory {}", directory.display()))?
            {
                let path = entry?.path();
                if path.is_file() {
                    files.push(path);
                }
            }
            files
        };

        Ok(files
            .iter()
            .any(|file| globs.is_match(relative_path(directory, file))))
    }
}

impl Check for DirectoryExistsCheck {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut CheckInfo {
        &mut self.info
    }

    fn run(&mut self) -> Result<()> {
        self.info.reset();
        self.note = None;

        let directory = self.root.join(&self.path);
        if !directory.is_dir() {
            self.info.status = self.info.status_when_failed;
            self.note = Some(format!("Directory {} does not exist.", self.path));
            return Ok(());
        }

        let is_empty = fs::read_dir(&directory)
            .with_context(|| format!("Failed to read directory {}", directory.display()))?
            .next()
            .is_none();

        if is_empty {
            self.info.status = self.status_when_empty;
            self.note = Some(format!("Directory {} is empty.", self.path));
            return Ok(());
        }

        if !self.required_globs.is_empty() && !self.has_required_file(&directory)? {
            self.info.status = self.status_when_empty;
            self.note = Some(format!(
                "Directory {} contains no file matching any of: {}",
                self.path,
                self.required_globs.join(", ")
            ));
            return Ok(());
        }

        self.info.status = Status::Green;
        Ok(())
    }

    fn details(&self) -> Vec<String> {
        self.note.iter().cloned().collect()
    }
}
