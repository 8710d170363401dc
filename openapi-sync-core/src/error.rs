//! Error taxonomy for the sync pipeline.
//!
//! Every collaborator reports its own typed error ([`FetchError`], [`StorageError`],
//! [`PublishError`]). The orchestrator wraps whichever one aborted the run in a
//! [`SyncError`] tagged with the [`Stage`] it happened in, so a single log line is
//! enough to tell where a scheduled run stopped and why.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while retrieving the upstream document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout and similar transport problems.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered, but not with a success status.
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The body was received but is not well-formed JSON.
    #[error("response from {url} is not well-formed JSON: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by the versioned-storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{} is not inside a tracked storage target", .0.display())]
    NotARepository(PathBuf),

    #[error("`{command}` exited with {code:?}: {stderr}")]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure reported by the remote-sync collaborator.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no remote configured")]
    NoRemote,

    #[error("cannot publish from a detached HEAD")]
    DetachedHead,

    #[error("push to {remote}/{branch} was rejected: {summary}")]
    Rejected {
        remote: String,
        branch: String,
        summary: String,
    },

    #[error("`{command}` exited with {code:?}: {stderr}")]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The pipeline state a run aborted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Save,
    Detect,
    CommitRaw,
    PushRaw,
    Transform,
    CommitTransformed,
    PushTransformed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Save => "save",
            Stage::Detect => "detect",
            Stage::CommitRaw => "commit_raw",
            Stage::PushRaw => "push_raw",
            Stage::Transform => "transform",
            Stage::CommitTransformed => "commit_transformed",
            Stage::PushTransformed => "push_transformed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying cause of an aborted run.
#[derive(Debug, Error)]
pub enum SyncErrorKind {
    #[error("fetch error: {0}")]
    Fetch(#[source] FetchError),

    #[error("parse error: {0}")]
    Parse(#[source] FetchError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
}

impl From<FetchError> for SyncErrorKind {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Malformed { .. } => SyncErrorKind::Parse(e),
            other => SyncErrorKind::Fetch(other),
        }
    }
}

/// Terminal outcome of a run that did not reach `DONE`.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {cause}")]
pub struct SyncError {
    pub stage: Stage,
    #[source]
    pub cause: SyncErrorKind,
}

impl SyncError {
    pub fn new(stage: Stage, cause: impl Into<SyncErrorKind>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}
