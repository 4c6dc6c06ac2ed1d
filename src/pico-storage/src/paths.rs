//! Shared root resolution and fixed subpaths.
//!
//! Every cooperating process (the host app and the tunnel extension) must
//! agree on one root directory. The root is produced by a [`RootResolver`]
//! injected at startup, so nothing here depends on a particular OS sandboxing
//! mechanism:
//!
//! ```text
//! <shared-root>/
//!   logs/error.log
//!   logs/access.log
//!   datasets/<geo rule files>
//!   config.json
//! ```

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{Result, StorageError};

/// Subdirectory and file names.
pub const LOGS_DIR: &str = "logs";
pub const DATASETS_DIR: &str = "datasets";
pub const CONFIG_FILE: &str = "config.json";
pub const ERROR_LOG_FILE: &str = "error.log";
pub const ACCESS_LOG_FILE: &str = "access.log";

/// Resolves the shared root directory.
///
/// A resolver error is fatal for the whole process: every other component
/// addresses its files relative to this root.
pub trait RootResolver: Send + Sync {
    /// Resolve the root directory.
    fn resolve(&self) -> Result<PathBuf>;
}

/// A root supplied verbatim by configuration.
#[derive(Debug, Clone)]
pub struct FixedRoot(pub PathBuf);

impl FixedRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl RootResolver for FixedRoot {
    fn resolve(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

/// A group-scoped container below the platform data directory.
///
/// Resolves to `<data dir>/<group id>`, e.g.
/// `~/.local/share/group.me.lsong.picovpn` on Linux.
#[derive(Debug, Clone)]
pub struct GroupContainer {
    group_id: String,
    base: Option<PathBuf>,
}

impl GroupContainer {
    /// Create a resolver for the given group identity.
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            base: None,
        }
    }

    /// Use an explicit base directory instead of the platform data dir.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }
}

impl RootResolver for GroupContainer {
    fn resolve(&self) -> Result<PathBuf> {
        validate_group_id(&self.group_id)?;

        let base = match &self.base {
            Some(base) => base.clone(),
            None => dirs::data_dir().ok_or(StorageError::ContainerUnavailable)?,
        };
        let root = base.join(&self.group_id);
        debug!(group = %self.group_id, root = %root.display(), "Resolved shared group container");
        Ok(root)
    }
}

/// A group id must be a single, non-empty path component.
fn validate_group_id(group_id: &str) -> Result<()> {
    let trimmed = group_id.trim();
    if trimmed.is_empty() || trimmed != group_id {
        return Err(StorageError::InvalidGroup(group_id.to_string()));
    }

    let mut components = Path::new(group_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StorageError::InvalidGroup(group_id.to_string())),
    }
}

/// Fixed layout below a resolved root.
#[derive(Debug, Clone)]
pub struct SharedPaths {
    /// Shared root directory.
    pub root: PathBuf,
    /// Engine log directory.
    pub logs_dir: PathBuf,
    /// Geo rule dataset directory.
    pub datasets_dir: PathBuf,
    /// The active engine config.
    pub config_file: PathBuf,
}

impl SharedPaths {
    /// Lay out the fixed subpaths below `root`.
    pub fn from_root(root: PathBuf) -> Self {
        Self {
            logs_dir: root.join(LOGS_DIR),
            datasets_dir: root.join(DATASETS_DIR),
            config_file: root.join(CONFIG_FILE),
            root,
        }
    }

    /// Resolve a root with `resolver` and lay out the subpaths.
    pub fn resolve(resolver: &dyn RootResolver) -> Result<Self> {
        Ok(Self::from_root(resolver.resolve()?))
    }

    /// Engine error log.
    pub fn error_log(&self) -> PathBuf {
        self.logs_dir.join(ERROR_LOG_FILE)
    }

    /// Engine access log.
    pub fn access_log(&self) -> PathBuf {
        self.logs_dir.join(ACCESS_LOG_FILE)
    }

    /// Path of a named dataset file.
    pub fn dataset(&self, name: &str) -> PathBuf {
        self.datasets_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_paths_structure() {
        let paths = SharedPaths::from_root(PathBuf::from("/shared"));
        assert!(paths.logs_dir.ends_with(LOGS_DIR));
        assert!(paths.datasets_dir.ends_with(DATASETS_DIR));
        assert!(paths.config_file.ends_with(CONFIG_FILE));
        assert_eq!(paths.error_log(), PathBuf::from("/shared/logs/error.log"));
        assert_eq!(paths.access_log(), PathBuf::from("/shared/logs/access.log"));
        assert_eq!(
            paths.dataset("geoip.dat"),
            PathBuf::from("/shared/datasets/geoip.dat")
        );
    }

    #[test]
    fn test_fixed_root() {
        let resolver = FixedRoot::new("/tmp/pico");
        assert_eq!(resolver.resolve().unwrap(), PathBuf::from("/tmp/pico"));
    }

    #[test]
    fn test_group_container_with_base() {
        let resolver = GroupContainer::new("group.me.lsong.picovpn").with_base("/containers");
        assert_eq!(
            resolver.resolve().unwrap(),
            PathBuf::from("/containers/group.me.lsong.picovpn")
        );
    }

    #[test]
    fn test_group_container_rejects_invalid_ids() {
        for id in ["", "  ", "..", "a/b", "/abs", " group.padded"] {
            let err = GroupContainer::new(id).with_base("/containers").resolve();
            assert!(
                matches!(err, Err(StorageError::InvalidGroup(_))),
                "expected {id:?} to be rejected"
            );
        }
    }
}
