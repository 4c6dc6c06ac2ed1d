//! Turning share links into the active engine config.
//!
//! Translation produces the outbounds; assembly adds what only this host
//! knows (shared log paths, a local inbound on a free port) and replaces
//! `config.json` in one write.

use std::path::PathBuf;

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use pico_engine::{ConfigTranslator, NO_PORT, ResourceAllocator};
use pico_storage::SharedStorage;

use crate::config::AssemblyConfig;
use crate::error::{BridgeError, Result};

/// A config that has been written to shared storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledConfig {
    /// Where it was written.
    pub path: PathBuf,
    /// Port of the local inbound, when one was added.
    pub inbound_port: Option<u16>,
    /// Number of outbounds the engine produced.
    pub outbounds: usize,
}

/// Builds `config.json` from share links.
#[derive(Debug, Clone)]
pub struct ConfigAssembler {
    storage: SharedStorage,
    translator: ConfigTranslator,
    allocator: ResourceAllocator,
    config: AssemblyConfig,
}

impl ConfigAssembler {
    pub fn new(
        storage: SharedStorage,
        translator: ConfigTranslator,
        allocator: ResourceAllocator,
        config: AssemblyConfig,
    ) -> Self {
        Self {
            storage,
            translator,
            allocator,
            config,
        }
    }

    /// Translate `links`, complete the config and write it.
    pub fn assemble<L: AsRef<str>>(&self, links: &[L]) -> Result<AssembledConfig> {
        let translated = self.translator.links_to_config(links);
        if translated.is_empty() {
            return Err(BridgeError::TranslationFailed);
        }

        let mut document: Value = serde_json::from_str(&translated)?;
        let object = document.as_object_mut().ok_or(BridgeError::NotAnObject)?;

        object.insert("log".to_string(), self.log_section());

        let inbound_port = if self.config.inbound {
            let port = self.allocator.allocate_free_port();
            if port == NO_PORT {
                return Err(BridgeError::NoFreePort);
            }
            upsert_inbound(object, &self.config.inbound_tag, self.inbound(port));
            Some(port)
        } else {
            None
        };

        let outbounds = object
            .get("outbounds")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if outbounds == 0 {
            warn!("Assembled engine config has no outbounds");
        }

        let bytes = serde_json::to_vec_pretty(&document)?;
        self.storage.write_config(&bytes)?;

        let path = self.storage.config_path().to_path_buf();
        info!(path = %path.display(), outbounds, inbound_port = ?inbound_port, "Engine config assembled");
        Ok(AssembledConfig {
            path,
            inbound_port,
            outbounds,
        })
    }

    fn log_section(&self) -> Value {
        let mut log = Map::new();
        log.insert("loglevel".to_string(), json!(self.config.log_level));

        // Without the logs directory the engine could not open its files.
        if self.storage.logs_dir().is_dir() {
            log.insert(
                "access".to_string(),
                json!(self.storage.access_log_path().to_string_lossy()),
            );
            log.insert(
                "error".to_string(),
                json!(self.storage.error_log_path().to_string_lossy()),
            );
        } else {
            debug!(path = %self.storage.logs_dir().display(), "Logs directory missing, engine file logs disabled");
        }
        Value::Object(log)
    }

    fn inbound(&self, port: u16) -> Value {
        json!({
            "tag": self.config.inbound_tag,
            "listen": self.config.listen,
            "port": port,
            "protocol": "socks",
            "settings": {
                "auth": "noauth",
                "udp": true,
            },
            "sniffing": {
                "enabled": true,
                "destOverride": ["http", "tls"],
            },
        })
    }
}

/// Insert `inbound`, replacing any inbound with the same tag.
fn upsert_inbound(object: &mut Map<String, Value>, tag: &str, inbound: Value) {
    let inbounds = object
        .entry("inbounds")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !inbounds.is_array() {
        *inbounds = Value::Array(Vec::new());
    }

    if let Value::Array(list) = inbounds {
        list.retain(|existing| existing.get("tag").and_then(Value::as_str) != Some(tag));
        list.push(inbound);
    }
}
