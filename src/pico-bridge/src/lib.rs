//! PicoVPN engine bridge.
//!
//! Ties the shared storage area to the proxy engine for one process:
//!
//! 1. share links are translated by the engine into a config,
//! 2. a free local port is allocated for the inbound listener,
//! 3. the completed config replaces `config.json` in shared storage,
//! 4. routing datasets are loaded and the engine is started from that file.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pico_bridge::{BridgeConfig, ProxyBridge};
//!
//! let config = BridgeConfig::load("bridge.toml")?;
//! let mut bridge = ProxyBridge::new(config, Arc::new(pico_libxray::LibXray::new()))?;
//! let _logs = bridge.init_logging()?;
//!
//! let assembled = bridge.connect(&["vless://uuid@example.com:443?security=tls#edge"])?;
//! println!("socks5 on port {:?}, engine {}", assembled.inbound_port, bridge.version());
//!
//! bridge.disconnect();
//! ```

pub mod assembly;
pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;

pub use assembly::{AssembledConfig, ConfigAssembler};
pub use bridge::{DatasetOutcome, DatasetStatus, ProxyBridge};
pub use config::{
    AssemblyConfig, BridgeConfig, DEFAULT_GROUP_ID, DatasetConfig, EngineSettings, LoggingConfig,
    StorageConfig,
};
pub use error::{BridgeError, Result};
pub use logging::{BRIDGE_LOG_FILE, LogGuard, init_tracing};

pub use pico_engine::{EngineAbi, EngineState, GeoDataKind, ShareLink};
pub use pico_storage::{SharedStorage, StorageReport};
