//! Bridge configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a
//! valid configuration:
//!
//! ```toml
//! [storage]
//! group_id = "group.me.lsong.picovpn"
//!
//! [engine]
//! restart_policy = "stop-then-start"
//! translation_response = "base64"
//! geo_response = "plain"
//!
//! [logging]
//! level = "info"
//!
//! [assembly]
//! listen = "127.0.0.1"
//!
//! [[datasets]]
//! file = "geoip.dat"
//! kind = "ip-rules"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pico_engine::{GeoDataKind, ResponseEncoding, RestartPolicy};
use pico_storage::{FixedRoot, GroupContainer, RootResolver};

use crate::error::Result;

/// Shared-group identity used when none is configured.
pub const DEFAULT_GROUP_ID: &str = "group.me.lsong.picovpn";

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub storage: StorageConfig,
    pub engine: EngineSettings,
    pub logging: LoggingConfig,
    pub assembly: AssemblyConfig,
    pub datasets: Vec<DatasetConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            engine: EngineSettings::default(),
            logging: LoggingConfig::default(),
            assembly: AssemblyConfig::default(),
            datasets: vec![
                DatasetConfig::new("geoip.dat", GeoDataKind::IpRules),
                DatasetConfig::new("geosite.dat", GeoDataKind::SiteRules),
            ],
        }
    }
}

impl BridgeConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Where the shared root lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Shared-group identity; resolved below the platform data directory.
    pub group_id: Option<String>,
    /// Explicit root. Wins over `group_id`.
    pub root: Option<PathBuf>,
}

impl StorageConfig {
    /// The resolver this configuration describes.
    pub fn resolver(&self) -> Box<dyn RootResolver> {
        match (&self.root, &self.group_id) {
            (Some(root), _) => Box::new(FixedRoot::new(root.clone())),
            (None, Some(group_id)) => Box::new(GroupContainer::new(group_id.clone())),
            (None, None) => Box::new(GroupContainer::new(DEFAULT_GROUP_ID)),
        }
    }
}

/// Engine boundary conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// What `start` does while the engine is running.
    pub restart_policy: RestartPolicy,
    /// Encoding of conversion results.
    pub translation_response: ResponseEncoding,
    /// Encoding of geo-data results.
    pub geo_response: ResponseEncoding,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            restart_policy: RestartPolicy::StopThenStart,
            translation_response: ResponseEncoding::Base64,
            geo_response: ResponseEncoding::Plain,
        }
    }
}

/// Bridge log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `pico_engine=debug,info`.
    pub level: String,
    /// Emit JSON lines on stderr.
    pub json: bool,
    /// Also write `bridge.log` into the shared logs directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: true,
        }
    }
}

/// How translated configs are completed before they are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Add a local SOCKS inbound on a freshly allocated port.
    pub inbound: bool,
    /// Listen address of that inbound.
    pub listen: String,
    /// Tag of that inbound; an existing inbound with this tag is replaced.
    pub inbound_tag: String,
    /// Engine log level written into the config.
    pub log_level: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            inbound: true,
            listen: "127.0.0.1".to_string(),
            inbound_tag: "socks-in".to_string(),
            log_level: "warning".to_string(),
        }
    }
}

/// A routing dataset expected in the shared `datasets/` directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// File name below `datasets/`.
    pub file: String,
    pub kind: GeoDataKind,
}

impl DatasetConfig {
    pub fn new(file: impl Into<String>, kind: impl Into<GeoDataKind>) -> Self {
        Self {
            file: file.into(),
            kind: kind.into(),
        }
    }
}
