use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

use super::{Check, CheckInfo, Status, relative_path, walk_files};

/// Check that a file matching `pattern` exists below the repository root.
///
/// The file-name component may carry a `*` wildcard and is matched
/// case-insensitively against the directory part of the pattern.
/// A single match passes (or takes `status_when_empty` when it has zero bytes),
/// several matches are ambiguous and yield Yellow.
pub struct FileExistsCheck {
    info: CheckInfo,
    pattern: String,
    root: PathBuf,
    recursive: bool,
    status_when_empty: Status,
    matches: Vec<PathBuf>,
    empty: bool,
}

impl FileExistsCheck {
    pub fn new(info: CheckInfo, pattern: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            info,
            pattern: pattern.into(),
            root: root.into(),
            recursive: false,
            status_when_empty: Status::Green,
            matches: Vec::new(),
            empty: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn status_when_empty(mut self, status: Status) -> Self {
        self.status_when_empty = status;
        self
    }

    pub fn matches(&self) -> &[PathBuf] {
        &self.matches
    }

    fn split_pattern(&self) -> (PathBuf, String) {
        let pattern = Path::new(&self.pattern);
        let directory = pattern.parent().map(Path::to_path_buf).unwrap_or_default();
        let file_name = pattern
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        (directory, file_name)
    }

    fn find_matches(&self, directory: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>> {
        if !directory.is_dir() {
            return Ok(Vec::new());
        }

        let candidates = if self.recursive {
            walk_files(directory)?
        } else {
            let entries = fs::read_dir(directory)
                .with_context(|| format!("Failed to read directory {}", directory.display()))?;
            let mut files = Vec::new();
            for entry in entries {
                let path = entry?.path();
                if path.is_file() {
                    files.push(path);
                }
            }
            files
        };

        let mut matches: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|path| path.file_name().is_some_and(|name| matcher.is_match(name)))
            .collect();
        matches.sort();
        Ok(matches)
    }
}

impl Check for FileExistsCheck {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut CheckInfo {
        &mut self.info
    }

    fn run(&mut self) -> Result<()> {
        self.info.reset();
        self.empty = false;

        let (directory, file_name) = self.split_pattern();
        let matcher = GlobBuilder::new(&file_name)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid file pattern '{}'", self.pattern))?
            .compile_matcher();

        self.matches = self.find_matches(&self.root.join(&directory), &matcher)?;

        self.info.status = match self.matches.as_slice() {
            [] => self.info.status_when_failed,
            [single] => {
                let length = fs::metadata(single)
                    .with_context(|| format!("Failed to stat {}", single.display()))?
                    .len();
                self.empty = length == 0;
                if self.empty {
                    self.status_when_empty
                } else {
                    Status::Green
                }
            }
            _ => Status::Yellow,
        };

        tracing::debug!(
            "{}: {} match(es) for '{}' -> {}",
            self.info.name,
            self.matches.len(),
            self.pattern,
            self.info.status
        );
        Ok(())
    }

    fn details(&self) -> Vec<String> {
        let (directory, file_name) = self.split_pattern();
        let directory = if directory.as_os_str().is_empty() {
            ".".to_string()
        } else {
            directory.display().to_string()
        };

        match self.matches.len() {
            0 => vec![format!("No file matching {file_name} found in {directory}.")],
            1 if self.empty => vec![format!(
                "File {} is empty.",
                relative_path(&self.root, &self.matches[0])
            )],
            1 => Vec::new(),
            _ => {
                let mut lines = vec![format!(
                    "Multiple files matching {file_name} found in {directory}:"
                )];
                lines.extend(
                    self.matches
                        .iter()
                        .map(|path| format!("  {}", relative_path(&self.root, path))),
                );
                lines
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn info() -> CheckInfo {
        CheckInfo::new("README exists", "Check if README exists", "Create a README file.")
    }

    #[test]
    fn test_single_match_is_green() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Hello World").unwrap();

        let mut check = FileExistsCheck::new(info(), "README.*", temp_dir.path());
        check.run().unwrap();

        assert_eq!(check.status(), Status::Green);
        assert_eq!(check.matches().len(), 1);
    }

    #[test]
    fn test_wildcard_with_two_matches_is_yellow() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Hello World").unwrap();
        fs::write(temp_dir.path().join("README.txt"), "Hello World").unwrap();

        let mut check = FileExistsCheck::new(info(), "README.*", temp_dir.path());
        check.run().unwrap();

        assert_eq!(check.status(), Status::Yellow);
        assert!(check.render().contains("README.txt"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("readme.md"), "hello").unwrap();

        let mut check = FileExistsCheck::new(info(), "README.*", temp_dir.path());
        check.run().unwrap();

        assert_eq!(check.status(), Status::Green);
    }

    #[test]
    fn test_empty_file_uses_status_when_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("EMPTY_LICENSE"), "").unwrap();

        let mut default_check = FileExistsCheck::new(info(), "EMPTY_LICENSE", temp_dir.path());
        default_check.run().unwrap();
        assert_eq!(default_check.status(), Status::Green);

        let mut yellow_check = FileExistsCheck::new(info(), "EMPTY_LICENSE", temp_dir.path())
            .status_when_empty(Status::Yellow);
        yellow_check.run().unwrap();
        assert_eq!(yellow_check.status(), Status::Yellow);
        assert!(yellow_check.render().contains("is empty"));
    }

    #[test]
    fn test_missing_file_uses_status_when_failed() {
        let temp_dir = TempDir::new().unwrap();

        let mut check = FileExistsCheck::new(info(), "NOTEXISTINGFILE", temp_dir.path());
        check.run().unwrap();
        assert_eq!(check.status(), Status::Red);

        let mut lenient = FileExistsCheck::new(
            info().with_status_when_failed(Status::Yellow),
            "NOTEXISTINGFILE",
            temp_dir.path(),
        );
        lenient.run().unwrap();
        assert_eq!(lenient.status(), Status::Yellow);
    }

    #[test]
    fn test_pattern_with_directory_component() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("docs")).unwrap();
        fs::write(temp_dir.path().join("docs/CONTRIBUTING.md"), "be nice").unwrap();

        let mut check = FileExistsCheck::new(info(), "docs/contributing.*", temp_dir.path());
        check.run().unwrap();
        assert_eq!(check.status(), Status::Green);

        let mut missing_dir = FileExistsCheck::new(info(), "nope/contributing.*", temp_dir.path());
        missing_dir.run().unwrap();
        assert_eq!(missing_dir.status(), Status::Red);
    }

    #[test]
    fn test_recursive_search_finds_nested_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("a/b")).unwrap();
        fs::write(temp_dir.path().join("a/b/Dockerfile"), "FROM scratch").unwrap();

        let mut flat = FileExistsCheck::new(info(), "Dockerfile", temp_dir.path());
        flat.run().unwrap();
        assert_eq!(flat.status(), Status::Red);

        let mut nested = FileExistsCheck::new(info(), "Dockerfile", temp_dir.path()).recursive(true);
        nested.run().unwrap();
        assert_eq!(nested.status(), Status::Green);
    }

    #[test]
    fn test_run_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "").unwrap();

        let mut check = FileExistsCheck::new(info(), "README.*", temp_dir.path())
            .status_when_empty(Status::Yellow);
        check.run().unwrap();
        let first = (check.status(), check.render());
        check.run().unwrap();
        assert_eq!(first, (check.status(), check.render()));
    }
}
