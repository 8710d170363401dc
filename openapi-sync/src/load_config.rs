/// `load_config` module: merges the optional YAML config file, the environment and
/// CLI overrides into the core [`SyncConfig`].
///
/// # Responsibilities
/// - Parse the (optional) YAML file into typed sections
/// - Resolve the document location: CLI flag, then `OPENAPI_SPEC_URL`, then `source.url`
/// - Fail before any pipeline step when no location is configured
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use openapi_sync_core::config::{
    SyncConfig, DEFAULT_RAW_FILE, DEFAULT_TIMEOUT, DEFAULT_TRANSFORMED_STEM,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const SOURCE_URL_ENV: &str = "OPENAPI_SPEC_URL";

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct SourceSection {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    pub working_dir: Option<PathBuf>,
    pub raw_file: Option<String>,
    pub transformed_stem: Option<String>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub url: Option<String>,
    pub working_dir: Option<PathBuf>,
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let config_content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    match serde_yaml::from_str::<Option<FileConfig>>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Builds the run configuration. `path` is the optional YAML file.
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<SyncConfig> {
    let file = match path {
        Some(path) => read_file_config(path)?,
        None => FileConfig::default(),
    };

    let env_url = std::env::var(SOURCE_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty());

    let source_url = match overrides.url.or(env_url).or(file.source.url) {
        Some(url) => url,
        None => {
            error!("{SOURCE_URL_ENV} environment variable is not set");
            anyhow::bail!(
                "No document location configured: set {SOURCE_URL_ENV}, source.url or --url"
            );
        }
    };

    if source_url.trim().is_empty() {
        error!("Configured document location is blank");
        anyhow::bail!("Document location must not be empty");
    }

    let timeout = match file.source.timeout_secs {
        Some(0) => {
            error!("source.timeout_secs is 0");
            anyhow::bail!("source.timeout_secs must be at least 1");
        }
        Some(secs) => Duration::from_secs(secs),
        None => DEFAULT_TIMEOUT,
    };

    let config = SyncConfig {
        source_url,
        timeout,
        working_dir: overrides
            .working_dir
            .or(file.output.working_dir)
            .unwrap_or_else(|| PathBuf::from(".")),
        raw_file: file
            .output
            .raw_file
            .unwrap_or_else(|| DEFAULT_RAW_FILE.to_string()),
        transformed_stem: file
            .output
            .transformed_stem
            .unwrap_or_else(|| DEFAULT_TRANSFORMED_STEM.to_string()),
    };

    config.trace_loaded();
    Ok(config)
}
