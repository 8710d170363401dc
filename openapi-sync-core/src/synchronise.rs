//! High-level pipeline: fetch → save → detect → commit/push raw → transform → commit/push transformed.
//!
//! This module sequences one scheduled run. It is a strict linear state machine:
//!   - Fetches the upstream document and persists its canonical raw form
//!   - Asks versioned storage whether the raw file materially changed; if not, the run is done
//!   - Otherwise records and publishes the raw file, then the transformed pair
//!
//! # Error Handling
//! Every stage failure returns immediately as a [`SyncError`] naming the stage.
//! Nothing already written or recorded is rolled back, and nothing is retried:
//! the scheduler re-invokes the whole pipeline.
//!
//! # Concurrency
//! Assumes it is the sole writer to the working directory and storage target for
//! the duration of the run. No locking is done.

use std::path::Path;

use tracing::{error, info};

use crate::config::{SyncConfig, RAW_CHANGE_DESCRIPTION, TRANSFORMED_CHANGE_DESCRIPTION};
use crate::contract::{Fetcher, RecordId, RemoteSync, VersionedStorage};
use crate::detect::has_changed;
use crate::error::{Stage, SyncError, SyncErrorKind};
use crate::serialize::{serialize, sort_keys, Format};
use crate::transform::transform;

/// Outcome of a run that reached `DONE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The canonical raw document matched the last recorded snapshot.
    Unchanged,
    /// Both the raw and transformed artifacts were recorded and published.
    Published {
        raw_record: RecordId,
        transformed_record: RecordId,
    },
}

pub async fn synchronise<F, S, R>(
    config: &SyncConfig,
    fetcher: &F,
    storage: &S,
    remote: &R,
) -> Result<SyncOutcome, SyncError>
where
    F: Fetcher + ?Sized,
    S: VersionedStorage + ?Sized,
    R: RemoteSync + ?Sized,
{
    info!(url = %config.source_url, "[SYNC] Starting OpenAPI synchronisation");

    // --- FETCHED ---
    let document = fetcher
        .fetch(&config.source_url)
        .await
        .map_err(|e| abort(Stage::Fetch, e))?;

    // --- SAVED_RAW ---
    let canonical = sort_keys(&document);
    let raw_path = config.raw_path();
    let raw_text = serialize(&canonical, Format::RAW).map_err(|e| abort(Stage::Save, e))?;
    write_artifact(&raw_path, &raw_text)
        .await
        .map_err(|e| abort(Stage::Save, e))?;

    // --- NO_CHANGE | CHANGED ---
    let changed = has_changed(storage, &raw_path)
        .await
        .map_err(|e| abort(Stage::Detect, e))?;
    if !changed {
        info!("[SYNC] No changes detected. Nothing to commit.");
        return Ok(SyncOutcome::Unchanged);
    }
    info!("[SYNC] Changes detected, proceeding with commit, push and transform");

    // --- COMMITTED_RAW ---
    let raw_record = storage
        .record_change(std::slice::from_ref(&raw_path), RAW_CHANGE_DESCRIPTION)
        .await
        .map_err(|e| abort(Stage::CommitRaw, e))?;
    info!(record = %raw_record.short(), "[SYNC] Recorded raw document");

    // --- PUSHED_RAW ---
    remote
        .publish()
        .await
        .map_err(|e| abort(Stage::PushRaw, e))?;
    info!("[SYNC] Published raw document");

    // --- TRANSFORMED ---
    let output = transform(canonical).map_err(|e| abort(Stage::Transform, e))?;
    let pretty_path = config.transformed_pretty_path();
    let compact_path = config.transformed_compact_path();
    write_artifact(&pretty_path, &output.pretty)
        .await
        .map_err(|e| abort(Stage::Transform, e))?;
    write_artifact(&compact_path, &output.compact)
        .await
        .map_err(|e| abort(Stage::Transform, e))?;

    // --- COMMITTED_TRANSFORMED ---
    let transformed_record = storage
        .record_change(&[pretty_path, compact_path], TRANSFORMED_CHANGE_DESCRIPTION)
        .await
        .map_err(|e| abort(Stage::CommitTransformed, e))?;
    info!(record = %transformed_record.short(), "[SYNC] Recorded transformed documents");

    // --- PUSHED_TRANSFORMED ---
    remote
        .publish()
        .await
        .map_err(|e| abort(Stage::PushTransformed, e))?;
    info!("[SYNC] All operations completed successfully");

    Ok(SyncOutcome::Published {
        raw_record,
        transformed_record,
    })
}

fn abort(stage: Stage, cause: impl Into<SyncErrorKind>) -> SyncError {
    let err = SyncError::new(stage, cause);
    error!(stage = %stage, error = %err.cause, "[SYNC][ERROR] Aborting run");
    err
}

async fn write_artifact(path: &Path, content: &str) -> Result<(), SyncErrorKind> {
    info!(path = %path.display(), "Saving artifact");
    tokio::fs::write(path, content)
        .await
        .map_err(|source| SyncErrorKind::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), bytes = content.len(), "Saved artifact");
    Ok(())
}
