#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A scratch git working tree with a bare `origin` it can push to.
pub struct TestRepo {
    _tmp: TempDir,
    pub work: PathBuf,
    pub origin: PathBuf,
}

impl TestRepo {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let work = tmp.path().join("work");
        let origin = tmp.path().join("origin.git");
        std::fs::create_dir_all(&work).expect("create work dir");

        git(tmp.path(), &["init", "--bare", "--quiet", origin.to_str().unwrap()]);
        git(&work, &["init", "--quiet"]);
        git(&work, &["config", "user.name", "Sync Bot"]);
        git(&work, &["config", "user.email", "sync-bot@example.com"]);
        git(&work, &["config", "commit.gpgsign", "false"]);

        Self {
            _tmp: tmp,
            work,
            origin,
        }
    }

    pub fn with_origin() -> Self {
        let repo = Self::new();
        git(&repo.work, &["remote", "add", "origin", repo.origin.to_str().unwrap()]);
        repo
    }

    pub fn git(&self, args: &[&str]) -> String {
        git(&self.work, args)
    }

    pub fn commit_count(&self) -> usize {
        let out = Command::new("git")
            .arg("-C")
            .arg(&self.work)
            .args(["rev-list", "--count", "HEAD"])
            .output()
            .expect("run git");
        if !out.status.success() {
            return 0;
        }
        String::from_utf8_lossy(&out.stdout).trim().parse().unwrap()
    }

    pub fn branch(&self) -> String {
        self.git(&["symbolic-ref", "--short", "HEAD"])
    }

    /// Tip of the current branch as seen by `origin`.
    pub fn origin_tip(&self) -> String {
        git(&self.origin, &["rev-parse", &self.branch()])
    }
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("run git");
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}
