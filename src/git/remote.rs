use anyhow::{Context, Result, anyhow, bail};
use std::path::Path;
use std::process::Command;

/// Repository name from a clone URL: last path segment without `.git`
pub fn repo_name_from_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = segment.strip_suffix(".git").unwrap_or(segment);

    if name.is_empty() || name == "." || name == ".." {
        bail!("Cannot derive a repository name from URL '{}'", url);
    }
    Ok(name.to_string())
}

/// Clone `url` into `target` using system git, replacing whatever is there
pub fn clone_with_system_git(url: &str, target: &Path) -> Result<()> {
    if target.exists() {
        tracing::debug!("Removing stale clone at {}", target.display());
        std::fs::remove_dir_all(target)
            .with_context(|| format!("Failed to remove stale clone at {}", target.display()))?;
    }

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create clone directory {}", parent.display()))?;
    }

    tracing::info!("Cloning {} into {}", url, target.display());

    let output = Command::new("git")
        .args(["clone", "--quiet", url])
        .arg(target)
        .output()
        .context("Failed to run git clone")?;

    if !output.status.success() {
        if target.exists()
            && let Err(e) = std::fs::remove_dir_all(target)
        {
            tracing::warn!("Failed to remove partial clone at {}: {}", target.display(), e);
        }
        let error_msg = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "Failed to clone repository '{}': {}",
            url,
            error_msg.trim()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name_from_url() {
        assert_eq!(
            repo_name_from_url("https://github.com/acme/widgets.git").unwrap(),
            "widgets"
        );
        assert_eq!(
            repo_name_from_url("https://github.com/acme/widgets/").unwrap(),
            "widgets"
        );
        assert_eq!(repo_name_from_url("git@github.com:acme/tools.git").unwrap(), "tools");
        assert_eq!(repo_name_from_url("git@host:solo.git").unwrap(), "solo");
        assert!(repo_name_from_url("https://").is_err());
        assert!(repo_name_from_url("").is_err());
    }

    #[test]
    fn test_failed_clone_leaves_no_directory() {
        if which::which("git").is_err() {
            return;
        }
        let temp_dir = tempfile::TempDir::new().unwrap();
        let source = temp_dir.path().join("does-not-exist");
        let target = temp_dir.path().join("clones/does-not-exist");

        let err = clone_with_system_git(source.to_str().unwrap(), &target).unwrap_err();

        assert!(err.to_string().contains("Failed to clone repository"));
        assert!(!target.exists());
    }
}
