//! # Run Persistence
//!
//! Writes each finalized [`ScanRun`] to a timestamped JSON file and
//! loads them back for report-only processing. A write failure here is
//! fatal for the run and surfaced to the caller; nothing downgrades it
//! to a warning.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use vigil_common::model::ScanRun;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot write scan results to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read scan results from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("scan results in {path} are not valid: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub struct RunStore {
    directory: PathBuf,
}

impl RunStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Persists `run` as `scan_results_<start-time>.json`, creating the
    /// report directory on demand.
    pub fn save(&self, run: &ScanRun) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.directory).map_err(|source| StoreError::Write {
            path: self.directory.clone(),
            source,
        })?;

        let filename = format!(
            "scan_results_{}.json",
            run.scan_metadata.start_time.format("%Y%m%d_%H%M%S")
        );
        let path = self.directory.join(filename);

        let json = serde_json::to_string_pretty(run).map_err(|source| StoreError::Format {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

        info!("scan results saved to {}", path.display());
        Ok(path)
    }

    /// Loads a previously persisted run.
    pub fn load(path: &Path) -> Result<ScanRun, StoreError> {
        let raw = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
