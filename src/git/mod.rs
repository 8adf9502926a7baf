//! Repository acquisition
//!
//! A [`RepositorySnapshot`] is the working copy the checks run against, either
//! an existing local repository or a fresh clone. Clones are removed when the
//! snapshot is dropped unless cleanup was disabled; local repositories are never touched.

use anyhow::{Context, Result, bail};
use git2::{ErrorCode, Repository};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::linter::ReportHeader;

pub mod remote;

pub use remote::repo_name_from_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOrigin {
    Local,
    Cloned { url: String },
}

#[derive(Debug)]
pub struct RepositorySnapshot {
    root: PathBuf,
    name: String,
    origin: SnapshotOrigin,
    cleanup_on_drop: bool,
}

impl RepositorySnapshot {
    /// Use an existing local working copy
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            bail!("Path does not exist: {}", path.display());
        }

        let repo = Repository::open(path)
            .with_context(|| format!("Path is not a git repository: {}", path.display()))?;
        let workdir = repo
            .workdir()
            .with_context(|| format!("Bare repositories cannot be linted: {}", path.display()))?;

        let root = workdir
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", workdir.display()))?;
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        tracing::debug!("Opened local repository {} at {}", name, root.display());

        Ok(Self {
            root,
            name,
            origin: SnapshotOrigin::Local,
            cleanup_on_drop: false,
        })
    }

    /// Clone `url` below `parent`; with `cleanup` the clone is deleted on drop
    pub fn clone_from(url: &str, parent: impl AsRef<Path>, cleanup: bool) -> Result<Self> {
        let name = repo_name_from_url(url)?;
        let root = parent.as_ref().join(&name);

        remote::clone_with_system_git(url, &root)?;

        Ok(Self {
            root,
            name,
            origin: SnapshotOrigin::Cloned {
                url: url.to_string(),
            },
            cleanup_on_drop: cleanup,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &SnapshotOrigin {
        &self.origin
    }

    fn repository(&self) -> Result<Repository> {
        Repository::open(&self.root)
            .with_context(|| format!("Failed to open repository at {}", self.root.display()))
    }

    /// Commits reachable from HEAD; 0 for a repository without commits
    pub fn commit_count(&self) -> Result<usize> {
        let repo = self.repository()?;
        let Some(revwalk) = head_revwalk(&repo)? else {
            return Ok(0);
        };

        let mut count = 0;
        for oid in revwalk {
            oid.context("Failed to walk commit history")?;
            count += 1;
        }
        Ok(count)
    }

    /// Commit authors as `Name <email>`, most commits first
    pub fn contributors(&self) -> Result<Vec<String>> {
        let repo = self.repository()?;
        let Some(revwalk) = head_revwalk(&repo)? else {
            return Ok(Vec::new());
        };

        let mut counts: HashMap<String, usize> = HashMap::new();
        for oid in revwalk {
            let oid = oid.context("Failed to walk commit history")?;
            let commit = repo
                .find_commit(oid)
                .with_context(|| format!("Failed to read commit {oid}"))?;
            let author = commit.author();
            let key = format!(
                "{} <{}>",
                String::from_utf8_lossy(author.name_bytes()),
                String::from_utf8_lossy(author.email_bytes())
            );
            *counts.entry(key).or_default() += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|(a_name, a_count), (b_name, b_count)| {
            b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
        });
        Ok(ranked.into_iter().map(|(name, _)| name).collect())
    }

    pub fn header(&self) -> Result<ReportHeader> {
        Ok(ReportHeader {
            repository: self.name.clone(),
            commit_count: self.commit_count()?,
            contributors: self.contributors()?,
        })
    }

    /// Remove a cloned working copy now. A no-op for local repositories.
    pub fn cleanup(&mut self) -> Result<()> {
        self.cleanup_on_drop = false;
        if self.origin == SnapshotOrigin::Local || !self.root.exists() {
            return Ok(());
        }

        tracing::info!("Removing cloned repository {}", self.root.display());
        std::fs::remove_dir_all(&self.root)
            .with_context(|| format!("Failed to remove {}", self.root.display()))
    }

    /// Keep a cloned working copy on disk after the snapshot is dropped
    pub fn keep(&mut self) {
        self.cleanup_on_drop = false;
    }
}

impl Drop for RepositorySnapshot {
    fn drop(&mut self) {
        if self.cleanup_on_drop
            && let Err(e) = self.cleanup()
        {
            tracing::warn!("{:#}", e);
        }
    }
}

/// History walk from HEAD, `None` when HEAD is unborn
fn head_revwalk(repo: &Repository) -> Result<Option<git2::Revwalk<'_>>> {
    match repo.head() {
        Ok(_) => {}
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(None);
        }
        Err(e) => return Err(e).context("Failed to resolve HEAD"),
    }

    let mut revwalk = repo.revwalk().context("Failed to start commit walk")?;
    revwalk.push_head().context("Failed to walk from HEAD")?;
    Ok(Some(revwalk))
}
