use std::path::Path;

use tracing::{error, info};

use crate::contract::VersionedStorage;
use crate::error::StorageError;

/// Asks `storage` whether the already-persisted candidate at `path` differs from
/// the last recorded snapshot. Untracked counts as changed. Read-only.
pub async fn has_changed<S>(storage: &S, path: &Path) -> Result<bool, StorageError>
where
    S: VersionedStorage + ?Sized,
{
    match storage.is_target_changed(path).await {
        Ok(true) => {
            info!(path = %path.display(), "[DETECT] Changes detected");
            Ok(true)
        }
        Ok(false) => {
            info!(path = %path.display(), "[DETECT] No changes");
            Ok(false)
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "[DETECT][ERROR] Change detection failed");
            Err(e)
        }
    }
}
