//! Git-backed storage and remote sync: implements the core collaborator traits
//! on top of the `git` CLI.
//!
//! [`GitRepository`] wraps a working tree and implements both
//! [`VersionedStorage`] (change detection + commits) and [`RemoteSync`] (push).
//!
//! - [`GitRepository::new`] only resolves the path. The work-tree check runs on
//!   the first storage query, so a bad directory fails the `detect` stage.
//! - Every operation shells out to `git` with terminal prompts disabled, so a
//!   missing credential fails the run instead of hanging it.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use openapi_sync_core::contract::{RecordId, RemoteSync, VersionedStorage};
use openapi_sync_core::error::{PublishError, StorageError};

pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Ok(Self {
            root: absolute(&dir.into())?,
        })
    }

    /// [`GitRepository::new`] followed by an eager work-tree check.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let repo = Self::new(dir)?;
        repo.ensure_work_tree().await?;
        Ok(repo)
    }

    async fn ensure_work_tree(&self) -> Result<(), StorageError> {
        let output = git(&self.root, &["rev-parse", "--is-inside-work-tree"]).await?;
        if !output.status.success() || String::from_utf8_lossy(&output.stdout).trim() != "true" {
            tracing::error!(path = %self.root.display(), "Not in a git repository");
            return Err(StorageError::NotARepository(self.root.clone()));
        }
        tracing::debug!(path = %self.root.display(), "Inside a git work tree");
        Ok(())
    }

    async fn run_storage(&self, args: &[&str]) -> Result<String, StorageError> {
        let output = git(&self.root, args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(args = ?args, stderr = %stderr, "git command failed");
            return Err(StorageError::Command {
                command: format!("git {}", args.join(" ")),
                code: output.status.code(),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_publish(&self, args: &[&str]) -> Result<Output, PublishError> {
        Ok(git(&self.root, args).await?)
    }
}

async fn git(dir: &Path, args: &[&str]) -> Result<Output, std::io::Error> {
    tracing::debug!(dir = %dir.display(), args = ?args, "Running git");
    Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .await
}

/// Relative paths are resolved against the process working directory, not the
/// repository root, so they can be handed to `git -C <root>` unchanged.
fn absolute(path: &Path) -> Result<PathBuf, std::io::Error> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn path_args(paths: &[PathBuf]) -> Result<Vec<String>, std::io::Error> {
    paths
        .iter()
        .map(|p| Ok(absolute(p)?.to_string_lossy().into_owned()))
        .collect()
}

#[async_trait]
impl VersionedStorage for GitRepository {
    async fn is_target_changed(&self, path: &Path) -> Result<bool, StorageError> {
        self.ensure_work_tree().await?;
        let target = absolute(path)?.to_string_lossy().into_owned();
        let status = self
            .run_storage(&[
                "status",
                "--porcelain",
                "--untracked-files=all",
                "--",
                target.as_str(),
            ])
            .await?;

        match status.lines().next() {
            Some(line) if line.starts_with("??") => {
                tracing::info!(path = %path.display(), "File is untracked (new file)");
                Ok(true)
            }
            Some(_) => {
                tracing::info!(path = %path.display(), "Changes detected");
                Ok(true)
            }
            None => {
                tracing::info!(path = %path.display(), "No changes");
                Ok(false)
            }
        }
    }

    async fn record_change(
        &self,
        paths: &[PathBuf],
        description: &str,
    ) -> Result<RecordId, StorageError> {
        let files = path_args(paths)?;

        tracing::info!(files = ?files, "Adding files to git staging");
        let mut add: Vec<&str> = vec!["add", "--"];
        add.extend(files.iter().map(String::as_str));
        self.run_storage(&add).await?;

        let mut staged: Vec<&str> = vec!["diff", "--cached", "--quiet", "--"];
        staged.extend(files.iter().map(String::as_str));
        let has_staged = !git(&self.root, &staged).await?.status.success();

        tracing::info!(message = description, "Committing");
        let mut commit: Vec<&str> = vec!["commit", "--quiet", "-m", description];
        if has_staged {
            commit.push("--");
            commit.extend(files.iter().map(String::as_str));
        } else {
            // Content identical to HEAD: still record the run.
            commit.push("--allow-empty");
        }
        self.run_storage(&commit).await?;

        let head = self.run_storage(&["rev-parse", "HEAD"]).await?;
        let record = RecordId(head.trim().to_string());
        tracing::info!(hash = %record.short(), "Successfully committed");
        Ok(record)
    }
}

#[async_trait]
impl RemoteSync for GitRepository {
    async fn publish(&self) -> Result<(), PublishError> {
        let remotes = self.run_publish(&["remote"]).await?;
        let remotes: Vec<String> = String::from_utf8_lossy(&remotes.stdout)
            .lines()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect();
        let remote = match remotes.iter().find(|r| r.as_str() == "origin") {
            Some(origin) => origin.clone(),
            None => match remotes.first() {
                Some(first) => first.clone(),
                None => {
                    tracing::error!("No remote repository configured");
                    return Err(PublishError::NoRemote);
                }
            },
        };

        let head = self
            .run_publish(&["symbolic-ref", "--quiet", "--short", "HEAD"])
            .await?;
        if !head.status.success() {
            tracing::error!("HEAD is detached, refusing to push");
            return Err(PublishError::DetachedHead);
        }
        let branch = String::from_utf8_lossy(&head.stdout).trim().to_string();

        tracing::info!(remote = %remote, branch = %branch, "Pushing");
        let push = self
            .run_publish(&["push", "--porcelain", remote.as_str(), branch.as_str()])
            .await?;
        if push.status.success() {
            tracing::info!(remote = %remote, branch = %branch, "Successfully pushed");
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&push.stdout);
        let stderr = String::from_utf8_lossy(&push.stderr).trim().to_string();
        // --porcelain marks rejected refs with a leading '!'
        if let Some(line) = stdout.lines().find(|l| l.starts_with('!')) {
            tracing::error!(summary = %line, "Push rejected");
            tracing::info!("Try: git pull --rebase");
            return Err(PublishError::Rejected {
                remote,
                branch,
                summary: line.to_string(),
            });
        }

        tracing::error!(stderr = %stderr, "Push failed");
        Err(PublishError::Command {
            command: format!("git push {remote} {branch}"),
            code: push.status.code(),
            stderr,
        })
    }
}
