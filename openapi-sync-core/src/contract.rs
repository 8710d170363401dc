//! # contract: collaborator interfaces for the sync pipeline
//!
//! The orchestrator never talks to the network or to version control directly.
//! It is handed three collaborators:
//!
//! - [`Fetcher`]: turns a location into a parsed document.
//! - [`VersionedStorage`]: answers "did this file change?" and records new snapshots.
//! - [`RemoteSync`]: propagates whatever storage last recorded to a remote counterpart.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so tests can script each stage and
//!   inject failures at any single point of the run.
//! - The mocks are exported under the `test-export-mocks` feature (on by default)
//!   for downstream crates' integration tests.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;

use crate::error::{FetchError, PublishError, StorageError};

/// Identifier of a recorded change (for git, the commit hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId(pub String);

impl RecordId {
    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Retrieves and parses a structured document from a remote location.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `location` and parse the body as JSON.
    ///
    /// No retries: a failed fetch aborts the run and the external scheduler re-invokes it.
    async fn fetch(&self, location: &str) -> Result<Value, FetchError>;
}

/// Versioned storage of the working files.
///
/// Implementations are assumed to have exclusive access to their target for
/// the duration of a run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait VersionedStorage: Send + Sync {
    /// True if `path` is untracked, or tracked with content differing from the
    /// last recorded snapshot. Must not mutate storage.
    async fn is_target_changed(&self, path: &Path) -> Result<bool, StorageError>;

    /// Record all `paths` together as one change described by `description`.
    async fn record_change(
        &self,
        paths: &[PathBuf],
        description: &str,
    ) -> Result<RecordId, StorageError>;
}

/// Propagates recorded changes to a remote counterpart.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn publish(&self) -> Result<(), PublishError>;
}
