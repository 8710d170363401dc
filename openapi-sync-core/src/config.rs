use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RAW_FILE: &str = "openapi.json";
pub const DEFAULT_TRANSFORMED_STEM: &str = "openapi_transformed";

pub const RAW_CHANGE_DESCRIPTION: &str = "Update openapi spec";
pub const TRANSFORMED_CHANGE_DESCRIPTION: &str = "Update transformed openapi spec";

/// Runtime configuration of one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Location of the upstream document.
    pub source_url: String,
    /// Applies to the fetch only.
    pub timeout: Duration,
    pub working_dir: PathBuf,
    pub raw_file: String,
    pub transformed_stem: String,
}

impl SyncConfig {
    pub fn new(source_url: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            timeout: DEFAULT_TIMEOUT,
            working_dir: working_dir.into(),
            raw_file: DEFAULT_RAW_FILE.to_string(),
            transformed_stem: DEFAULT_TRANSFORMED_STEM.to_string(),
        }
    }

    pub fn raw_path(&self) -> PathBuf {
        self.working_dir.join(&self.raw_file)
    }

    pub fn transformed_pretty_path(&self) -> PathBuf {
        self.working_dir
            .join(format!("{}.json", self.transformed_stem))
    }

    pub fn transformed_compact_path(&self) -> PathBuf {
        self.working_dir
            .join(format!("{}_compressed.json", self.transformed_stem))
    }

    pub fn trace_loaded(&self) {
        info!(
            source_url = %self.source_url,
            working_dir = %self.working_dir.display(),
            timeout_secs = self.timeout.as_secs(),
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}
