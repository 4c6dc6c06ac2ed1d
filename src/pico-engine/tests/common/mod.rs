//! A loopback engine that really converts links and really probes ports.

#![allow(dead_code)]

use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use url::Url;

use pico_engine::EngineAbi;

pub const LOOPBACK_VERSION: &str = "loopback-1.0";

/// Speaks the libXray framing: base64 requests, base64 conversion results,
/// plain geo descriptors.
#[derive(Debug, Default)]
pub struct LoopbackEngine {
    running: AtomicBool,
}

impl LoopbackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn unframe(request: &str) -> Option<String> {
    String::from_utf8(STANDARD.decode(request).ok()?).ok()
}

fn frame(text: &str) -> String {
    STANDARD.encode(text)
}

/// The (protocol, host, port) a link or outbound resolves to.
pub fn server_of_link(link: &str) -> Option<(String, String, u16)> {
    let url = Url::parse(link).ok()?;
    Some((
        url.scheme().to_string(),
        url.host_str()?.to_string(),
        url.port()?,
    ))
}

impl EngineAbi for LoopbackEngine {
    fn run(&self, config_base64: &str) -> Option<String> {
        let config = unframe(config_base64)?;
        serde_json::from_str::<Value>(&config).ok()?;
        self.running.store(true, Ordering::SeqCst);
        Some(frame(r#"{"success":true}"#))
    }

    fn stop(&self) -> Option<String> {
        self.running.store(false, Ordering::SeqCst);
        Some(frame(r#"{"success":true}"#))
    }

    fn version(&self) -> Option<String> {
        Some(LOOPBACK_VERSION.to_string())
    }

    fn convert_links_to_config(&self, links_base64: &str) -> Option<String> {
        let text = unframe(links_base64)?;
        let outbounds: Vec<Value> = text
            .lines()
            .filter_map(|line| {
                let url = Url::parse(line.trim()).ok()?;
                Some(json!({
                    "protocol": url.scheme(),
                    "tag": url.fragment().unwrap_or("proxy"),
                    "settings": {
                        "address": url.host_str()?,
                        "port": url.port()?,
                        "user": url.username(),
                    }
                }))
            })
            .collect();
        if outbounds.is_empty() {
            return None;
        }
        Some(frame(&json!({ "outbounds": outbounds }).to_string()))
    }

    fn convert_config_to_links(&self, config_base64: &str) -> Option<String> {
        let config: Value = serde_json::from_str(&unframe(config_base64)?).ok()?;
        let links: Vec<String> = config
            .get("outbounds")?
            .as_array()?
            .iter()
            .filter_map(|outbound| {
                let settings = outbound.get("settings")?;
                Some(format!(
                    "{}://{}@{}:{}#{}",
                    outbound.get("protocol")?.as_str()?,
                    settings.get("user")?.as_str()?,
                    settings.get("address")?.as_str()?,
                    settings.get("port")?.as_u64()?,
                    outbound.get("tag")?.as_str()?,
                ))
            })
            .collect();
        Some(frame(&links.join("\n")))
    }

    fn free_ports(&self, count: u32) -> Option<String> {
        let listeners: Vec<TcpListener> = (0..count)
            .map(|_| TcpListener::bind("127.0.0.1:0"))
            .collect::<Result<_, _>>()
            .ok()?;
        let ports: Vec<u16> = listeners
            .iter()
            .map(|l| l.local_addr().map(|a| a.port()))
            .collect::<Result<_, _>>()
            .ok()?;
        drop(listeners);
        Some(json!({ "ports": ports }).to_string())
    }

    fn read_geo_files(&self, request_base64: &str) -> Option<String> {
        let request: Value = serde_json::from_str(&unframe(request_base64)?).ok()?;
        let path = request.get("path")?.as_str()?;
        let kind = request.get("type")?.as_str()?;
        if !Path::new(path).is_file() {
            return None;
        }
        Some(json!({ "path": path, "type": kind, "loaded": true }).to_string())
    }
}
