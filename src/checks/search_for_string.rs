use anyhow::{Context, Result, ensure};
use rayon::prelude::*;
use regex::bytes::Regex;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Check, CheckInfo, Status, relative_path, walk_files};
use crate::gitignore::IgnoreMatcher;

/// Bytes read per chunk while scanning a file
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Search every file of the snapshot for a literal string.
///
/// Found in at least one file is Green, otherwise `status_when_failed`.
/// `invert_result` flips that mapping so the check asserts absence instead.
/// Ignored files are still scanned so a hit that only exists in them can be
/// reported apart from a genuine miss, but they never count as a hit.
pub struct SearchForStringCheck {
    info: CheckInfo,
    needle: String,
    root: PathBuf,
    ignore: Arc<IgnoreMatcher>,
    invert_result: bool,
    respect_ignore: bool,
    found: Vec<String>,
    ignored_hits: Vec<String>,
}

impl SearchForStringCheck {
    pub fn new(
        info: CheckInfo,
        needle: impl Into<String>,
        root: impl Into<PathBuf>,
        ignore: Arc<IgnoreMatcher>,
    ) -> Self {
        Self {
            info,
            needle: needle.into(),
            root: root.into(),
            ignore,
            invert_result: false,
            respect_ignore: true,
            found: Vec::new(),
            ignored_hits: Vec::new(),
        }
    }

    pub fn invert_result(mut self, invert: bool) -> Self {
        self.invert_result = invert;
        self
    }

    /// When false every file counts, ignored or not
    pub fn respect_ignore(mut self, respect: bool) -> Self {
        self.respect_ignore = respect;
        self
    }

    /// Files (relative to the root) containing the needle that count as a hit
    pub fn found(&self) -> &[String] {
        &self.found
    }

    pub fn ignored_hits(&self) -> &[String] {
        &self.ignored_hits
    }
}

impl Check for SearchForStringCheck {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut CheckInfo {
        &mut self.info
    }

    fn run(&mut self) -> Result<()> {
        self.info.reset();
        self.found.clear();
        self.ignored_hits.clear();

        ensure!(!self.needle.is_empty(), "Search string for '{}' is empty", self.info.name);

        let pattern = Regex::new(&regex::escape(&self.needle))
            .with_context(|| format!("Failed to compile search for '{}'", self.needle))?;
        let needle_len = self.needle.len();
        let files = walk_files(&self.root)?;

        let hits = files
            .par_iter()
            .map(|file| -> Result<Option<(String, bool)>> {
                if !file_contains(file, &pattern, needle_len)? {
                    return Ok(None);
                }
                let relative = relative_path(&self.root, file);
                let ignored = self.respect_ignore && self.ignore.is_ignored(&relative);
                Ok(Some((relative, ignored)))
            })
            .collect::<Result<Vec<_>>>()?;

        for (relative, ignored) in hits.into_iter().flatten() {
            if ignored {
                self.ignored_hits.push(relative);
            } else {
                self.found.push(relative);
            }
        }

        let passed = !self.found.is_empty() != self.invert_result;
        self.info.status = if passed {
            Status::Green
        } else {
            self.info.status_when_failed
        };

        tracing::debug!(
            "{}: '{}' in {} file(s), {} ignored -> {}",
            self.info.name,
            self.needle,
            self.found.len(),
            self.ignored_hits.len(),
            self.info.status
        );
        Ok(())
    }

    fn details(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if self.found.is_empty() {
            lines.push(format!("Search string: {} not found.", self.needle));
        } else {
            lines.push(format!(
                "Search string: {} found in following files:",
                self.needle
            ));
            lines.extend(self.found.iter().map(|file| format!("  {file}")));
        }

        if !self.ignored_hits.is_empty() {
            let heading = if self.found.is_empty() {
                "Search string only found in ignored files:"
            } else {
                "Also found in ignored files:"
            };
            lines.push(heading.to_string());
            lines.extend(self.ignored_hits.iter().map(|file| format!("  {file}")));
        }

        lines
    }
}

/// Scan `path` chunk by chunk, carrying `needle_len - 1` bytes across chunk
/// boundaries so a match split between two reads is still seen
fn file_contains(path: &Path, pattern: &Regex, needle_len: usize) -> Result<bool> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let overlap = needle_len.saturating_sub(1);
    let mut buffer = vec![0u8; CHUNK_SIZE + overlap];
    let mut carried = 0;

    loop {
        let read = match file.read(&mut buffer[carried..carried + CHUNK_SIZE]) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        if read == 0 {
            return Ok(false);
        }

        let filled = carried + read;
        if pattern.is_match(&buffer[..filled]) {
            return Ok(true);
        }

        carried = overlap.min(filled);
        buffer.copy_within(filled - carried..filled, 0);
    }
}
