//! Ignore-file handling shared by the ignore-aware checks
//!
//! Patterns come from every `.gitignore` in the snapshot, an optional
//! `.repolintignore` at the root and extra patterns from configuration.
//! Matching follows git semantics: each ignore file is anchored at its own
//! directory, deeper files take precedence, and `!` re-includes a path unless
//! one of its parent directories is excluded.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Per-directory ignore file name recognised anywhere in the tree
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Tool-specific ignore file, read from the snapshot root only
pub const REPOLINT_IGNORE_FILE: &str = ".repolintignore";

#[derive(Debug)]
pub struct IgnoreMatcher {
    root: PathBuf,
    /// Ordered from shallowest to deepest anchor directory
    matchers: Vec<Gitignore>,
    patterns: Vec<String>,
    enabled: bool,
}

impl IgnoreMatcher {
    /// A matcher that never ignores anything and reads no sources
    pub fn disabled() -> Self {
        Self {
            root: PathBuf::new(),
            matchers: Vec::new(),
            patterns: Vec::new(),
            enabled: false,
        }
    }

    /// Load all ignore sources found in the snapshot at `root`
    pub fn load(root: &Path, extra_patterns: &[String]) -> Result<Self> {
        let mut sources = discover_gitignore_files(root)?;
        sources.push(root.join(REPOLINT_IGNORE_FILE));
        Self::from_sources(root, &sources, extra_patterns)
    }

    /// Build a matcher from explicit ignore files; missing files count as empty
    pub fn from_sources(root: &Path, sources: &[PathBuf], extra_patterns: &[String]) -> Result<Self> {
        let mut anchored: Vec<(usize, Gitignore)> = Vec::new();
        let mut patterns = Vec::new();

        for source in sources {
            if !source.is_file() {
                tracing::trace!("Ignore source {} not present, skipping", source.display());
                continue;
            }

            let content = fs::read_to_string(source)
                .with_context(|| format!("Failed to read ignore file: {}", source.display()))?;
            let lines = pattern_lines(&content);
            if lines.is_empty() {
                continue;
            }

            let anchor = source.parent().unwrap_or(root);
            let mut builder = GitignoreBuilder::new(anchor);
            for line in &lines {
                builder
                    .add_line(Some(source.clone()), line)
                    .with_context(|| format!("Invalid ignore pattern '{}' in {}", line, source.display()))?;
            }
            let matcher = builder
                .build()
                .with_context(|| format!("Failed to compile ignore file: {}", source.display()))?;

            tracing::debug!("Loaded {} ignore pattern(s) from {}", lines.len(), source.display());
            anchored.push((anchor.components().count(), matcher));
            patterns.extend(lines);
        }

        if !extra_patterns.is_empty() {
            let mut builder = GitignoreBuilder::new(root);
            for pattern in extra_patterns {
                builder
                    .add_line(None, pattern)
                    .with_context(|| format!("Invalid ignore pattern '{pattern}' in configuration"))?;
            }
            let matcher = builder.build().context("Failed to compile configured ignore patterns")?;
            anchored.push((root.components().count(), matcher));
            patterns.extend(extra_patterns.iter().cloned());
        }

        // Stable sort keeps the root .gitignore ahead of configured patterns at equal depth
        anchored.sort_by_key(|(depth, _)| *depth);

        Ok(Self {
            root: root.to_path_buf(),
            matchers: anchored.into_iter().map(|(_, matcher)| matcher).collect(),
            patterns,
            enabled: true,
        })
    }

    /// Whether `relative_path` (relative to the snapshot root) is excluded
    pub fn is_ignored(&self, relative_path: impl AsRef<Path>) -> bool {
        if !self.enabled || self.matchers.is_empty() {
            return false;
        }

        let relative: PathBuf = relative_path
            .as_ref()
            .components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect();
        if relative.as_os_str().is_empty() {
            return false;
        }

        // Like git, an excluded directory cannot have its contents re-included
        let components: Vec<Component> = relative.components().collect();
        let mut current = self.root.clone();
        for (index, component) in components.iter().enumerate() {
            current.push(component);
            let is_dir = index + 1 < components.len() || current.is_dir();
            if self.excludes(&current, is_dir) {
                return true;
            }
        }
        false
    }

    /// Last matching verdict for `absolute` itself, ignoring its parents
    fn excludes(&self, absolute: &Path, is_dir: bool) -> bool {
        let mut ignored = false;
        for matcher in &self.matchers {
            // An ignore file governs what lies below its directory, not the directory itself
            if absolute == matcher.path() || !absolute.starts_with(matcher.path()) {
                continue;
            }
            let verdict = matcher.matched(absolute, is_dir);
            if verdict.is_ignore() {
                ignored = true;
            } else if verdict.is_whitelist() {
                ignored = false;
            }
        }
        ignored
    }

    /// Raw pattern lines in load order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Pattern lines of an ignore file: blank lines and `#` comments dropped.
/// Trailing whitespace is left for `GitignoreBuilder`, which honours `\ ` escapes.
pub fn pattern_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn discover_gitignore_files(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut sources = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if entry.file_name() == GITIGNORE_FILE && entry.file_type().is_some_and(|ft| ft.is_file()) {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}
