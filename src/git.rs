// src/git.rs

//! Producing diffs by shelling out to `git`.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{ChangelinkError, Result};

/// `git diff` of the working tree in `repo`.
pub async fn diff_working_tree(repo: &Path) -> Result<String> {
    git(repo, &["diff"]).await
}

/// `git fetch origin <branch>` followed by `git diff origin/<branch>`.
pub async fn diff_against_branch(repo: &Path, branch: &str) -> Result<String> {
    validate_branch(branch)?;
    info!(branch, "fetching base branch");
    git(repo, &["fetch", "origin", branch]).await?;
    git(repo, &["diff", &format!("origin/{branch}")]).await
}

fn validate_branch(branch: &str) -> Result<()> {
    if branch.is_empty() || branch.starts_with('-') || branch.contains(char::is_whitespace) {
        return Err(ChangelinkError::ConfigError(format!(
            "invalid branch name: {branch:?}"
        )));
    }
    Ok(())
}

async fn git(repo: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, repo = %repo.display(), "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ChangelinkError::Other(anyhow::anyhow!(
            "git {} failed ({}): {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_like_branches_are_rejected() {
        assert!(validate_branch("--upload-pack=x").is_err());
        assert!(validate_branch("").is_err());
        assert!(validate_branch("main branch").is_err());
        assert!(validate_branch("release/1.2").is_ok());
    }
}
