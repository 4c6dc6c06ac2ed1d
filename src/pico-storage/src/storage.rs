//! The shared storage area and its bootstrap.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::atomic::atomic_write;
use crate::error::{Result, StorageError};
use crate::paths::{RootResolver, SharedPaths};

/// A capability that is unavailable because its directory could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedFeature {
    /// `logs/` is missing; engine and bridge file logs are unavailable.
    Logging,
    /// `datasets/` is missing; geo rule files cannot be stored.
    Datasets,
}

impl fmt::Display for DegradedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedFeature::Logging => write!(f, "logging"),
            DegradedFeature::Datasets => write!(f, "datasets"),
        }
    }
}

/// Outcome of [`SharedStorage::ensure_ready`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageReport {
    /// Features that degraded during bootstrap.
    pub degraded: Vec<DegradedFeature>,
}

impl StorageReport {
    /// Whether every subdirectory is in place.
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }

    /// Whether a specific feature degraded.
    pub fn is_degraded(&self, feature: DegradedFeature) -> bool {
        self.degraded.contains(&feature)
    }
}

/// Handle on the shared storage area.
#[derive(Debug, Clone)]
pub struct SharedStorage {
    paths: SharedPaths,
}

impl SharedStorage {
    /// Resolve the shared root. Resolver failures are fatal and returned as-is.
    pub fn open(resolver: &dyn RootResolver) -> Result<Self> {
        Ok(Self {
            paths: SharedPaths::resolve(resolver)?,
        })
    }

    /// Use an already-resolved root.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: SharedPaths::from_root(root.into()),
        }
    }

    /// Create the root and its subdirectories if absent.
    ///
    /// Idempotent. Only a root that cannot be created is an error; a missing
    /// subdirectory is logged and reported as a degraded feature.
    pub fn ensure_ready(&self) -> Result<StorageReport> {
        fs::create_dir_all(&self.paths.root).map_err(|source| StorageError::RootUnavailable {
            path: self.paths.root.clone(),
            source,
        })?;

        let mut report = StorageReport::default();
        let subdirs = [
            (&self.paths.logs_dir, DegradedFeature::Logging),
            (&self.paths.datasets_dir, DegradedFeature::Datasets),
        ];
        for (dir, feature) in subdirs {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!(
                    path = %dir.display(),
                    feature = %feature,
                    error = %e,
                    "Failed to create shared directory"
                );
                report.degraded.push(feature);
            }
        }

        debug!(root = %self.paths.root.display(), degraded = report.degraded.len(), "Shared storage ready");
        Ok(report)
    }

    /// The resolved layout.
    pub fn paths(&self) -> &SharedPaths {
        &self.paths
    }

    /// Shared root directory.
    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    /// Path of the active engine config.
    pub fn config_path(&self) -> &Path {
        &self.paths.config_file
    }

    /// Engine log directory.
    pub fn logs_dir(&self) -> &Path {
        &self.paths.logs_dir
    }

    /// Dataset directory.
    pub fn datasets_dir(&self) -> &Path {
        &self.paths.datasets_dir
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.paths.error_log()
    }

    pub fn access_log_path(&self) -> PathBuf {
        self.paths.access_log()
    }

    pub fn dataset_path(&self, name: &str) -> PathBuf {
        self.paths.dataset(name)
    }

    /// Replace the active config with `content`.
    ///
    /// The bytes must parse as JSON; the file is never patched in place.
    pub fn write_config(&self, content: &[u8]) -> Result<()> {
        serde_json::from_slice::<serde_json::Value>(content)?;
        atomic_write(&self.paths.config_file, content)?;
        debug!(path = %self.paths.config_file.display(), bytes = content.len(), "Wrote engine config");
        Ok(())
    }

    /// Read the active config.
    pub fn read_config(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.paths.config_file)?)
    }
}
