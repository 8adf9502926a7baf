//! Compliance checks
//!
//! Every rule is a [`Check`]: it owns its configuration, runs against one
//! repository snapshot and leaves a [`Status`] plus human-readable detail behind.
//! The variants live in their own modules and are boxed by the [`Linter`](crate::linter::Linter).

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

pub mod directory_exists;
pub mod file_exists;
pub mod file_path_contains;
pub mod license_file;
pub mod search_for_string;
pub mod secrets;
pub mod status;

pub use directory_exists::DirectoryExistsCheck;
pub use file_exists::FileExistsCheck;
pub use file_path_contains::FilePathContainsCheck;
pub use license_file::LicenseFileCheck;
pub use search_for_string::SearchForStringCheck;
pub use secrets::SecretsCheck;
pub use status::Status;

/// Identity and verdict shared by every check variant
#[derive(Debug, Clone)]
pub struct CheckInfo {
    /// Short name, unique within one linter; used for override lookup
    pub name: String,
    pub description: String,
    /// Advisory text shown when the check does not pass
    pub fix: String,
    pub status: Status,
    /// Status a check settles on when its rule is violated
    pub status_when_failed: Status,
    /// Lines appended after the run, e.g. by the override policy
    pub notes: Vec<String>,
}

impl CheckInfo {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        fix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            fix: fix.into(),
            status: Status::Gray,
            status_when_failed: Status::Red,
            notes: Vec::new(),
        }
    }

    pub fn with_status_when_failed(mut self, status: Status) -> Self {
        self.status_when_failed = status;
        self
    }

    /// Reset run state so a second run starts from scratch
    pub(crate) fn reset(&mut self) {
        self.status = Status::Gray;
        self.notes.clear();
    }
}

/// A single independently runnable compliance rule
pub trait Check: Send {
    fn info(&self) -> &CheckInfo;

    fn info_mut(&mut self) -> &mut CheckInfo;

    /// Evaluate the rule. `Err` means the verdict is unknown (tool failure),
    /// never that the rule was violated.
    fn run(&mut self) -> Result<()>;

    /// Variant-specific lines shown below a non-green result
    fn details(&self) -> Vec<String> {
        Vec::new()
    }

    fn name(&self) -> &str {
        &self.info().name
    }

    fn status(&self) -> Status {
        self.info().status
    }

    /// Name and icon when green; description, fix hint and details otherwise
    fn render(&self) -> String {
        let info = self.info();
        let mut lines = vec![format!("{}   {}", info.status.icon(), info.name)];

        if info.status != Status::Green {
            lines.push(format!("Description: {}", info.description));
            lines.push(format!("Tip to fix: {}", info.fix));
            lines.extend(self.details());
            lines.extend(info.notes.iter().cloned());
        }

        lines.join("\n")
    }
}

/// Collect every regular file below `dir`, skipping `.git`, sorted by path
pub(crate) fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_some_and(|ft| ft.is_file()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Path relative to `root` with `/` separators, as shown in reports and
/// handed to the ignore matcher
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FixedCheck {
        info: CheckInfo,
        outcome: Status,
    }

    impl Check for FixedCheck {
        fn info(&self) -> &CheckInfo {
            &self.info
        }

        fn info_mut(&mut self) -> &mut CheckInfo {
            &mut self.info
        }

        fn run(&mut self) -> Result<()> {
            self.info.status = self.outcome;
            Ok(())
        }

        fn details(&self) -> Vec<String> {
            vec!["extra detail".to_string()]
        }
    }

    #[test]
    fn test_green_render_is_single_line() {
        let mut check = FixedCheck {
            info: CheckInfo::new("README exists", "Check README", "Add one"),
            outcome: Status::Green,
        };
        check.run().unwrap();
        assert_eq!(check.render(), "✅   README exists");
    }

    #[test]
    fn test_failed_render_includes_hint_and_details() {
        let mut check = FixedCheck {
            info: CheckInfo::new("README exists", "Check README", "Add one"),
            outcome: Status::Red,
        };
        check.run().unwrap();

        let rendered = check.render();
        assert!(rendered.starts_with("❌   README exists"));
        assert!(rendered.contains("Description: Check README"));
        assert!(rendered.contains("Tip to fix: Add one"));
        assert!(rendered.ends_with("extra detail"));
    }

    #[test]
    fn test_walk_files_skips_git_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(".git/objects")).unwrap();
        fs::write(temp_dir.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        fs::create_dir_all(temp_dir.path().join("src")).unwrap();
        fs::write(temp_dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(temp_dir.path().join(".env"), "KEY=1").unwrap();

        let files = walk_files(temp_dir.path()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| relative_path(temp_dir.path(), f))
            .collect();

        assert_eq!(relative, vec![".env".to_string(), "src/main.rs".to_string()]);
    }
}
