//! End-to-end behavior of translation, allocation and lifecycle against a
//! loopback engine.

mod common;

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{LOOPBACK_VERSION, LoopbackEngine, server_of_link};
use pico_engine::{
    ConfigTranslator, EMPTY_GEO_DESCRIPTOR, EngineAbi, EngineController, EngineState, NO_PORT,
    ResourceAllocator,
};

fn servers<I: IntoIterator<Item = S>, S: AsRef<str>>(links: I) -> BTreeSet<(String, String, u16)> {
    links
        .into_iter()
        .filter_map(|l| server_of_link(l.as_ref()))
        .collect()
}

// =============================================================================
// Translation
// =============================================================================

#[test]
fn test_round_trip_preserves_servers() {
    let engine: Arc<dyn EngineAbi> = Arc::new(LoopbackEngine::new());
    let translator = ConfigTranslator::new(engine);
    let links = [
        "vless://3f2a@edge.example.com:443?security=tls#edge",
        "trojan://secret@10.0.0.7:8443#lab",
        "ss://user@relay.example.net:8388",
    ];

    let config = translator.links_to_config(&links);
    assert!(!config.is_empty());
    let back = translator.config_to_links(&config);

    assert_eq!(servers(back.iter()), servers(links));
}

#[test]
fn test_round_trip_of_single_link() {
    let engine: Arc<dyn EngineAbi> = Arc::new(LoopbackEngine::new());
    let translator = ConfigTranslator::new(engine);

    let config = translator.links_to_config(&["vmess://id@h.example:10086"]);
    let back = translator.config_to_links(&config);

    assert_eq!(back.len(), 1);
    assert_eq!(back[0].scheme(), Some("vmess"));
}

#[test]
fn test_malformed_input_yields_empty_string() {
    let engine: Arc<dyn EngineAbi> = Arc::new(LoopbackEngine::new());
    let translator = ConfigTranslator::new(engine);

    assert_eq!(translator.links_to_config(&["not a link"]), "");
    assert_eq!(translator.config_to_links_text("{ broken json"), "");
    assert!(translator.config_to_links("[]").is_empty());
}

// =============================================================================
// Resource allocation
// =============================================================================

#[test]
fn test_allocate_free_port_in_user_range() {
    let allocator = ResourceAllocator::new(Arc::new(LoopbackEngine::new()));

    let port = allocator.allocate_free_port();

    assert!(port == NO_PORT || port >= 1024, "unexpected port {port}");
}

#[test]
fn test_successive_single_ports_vary() {
    let allocator = ResourceAllocator::new(Arc::new(LoopbackEngine::new()));

    let samples: BTreeSet<u16> = (0..8).map(|_| allocator.allocate_free_port()).collect();

    assert!(!samples.contains(&NO_PORT));
    assert!(samples.len() >= 2, "every allocation returned {samples:?}");
}

#[test]
fn test_allocate_many_ports_are_distinct() {
    let allocator = ResourceAllocator::new(Arc::new(LoopbackEngine::new()));

    let reservation = allocator.allocate_free_ports(4);

    assert!(reservation.is_complete());
    let unique: BTreeSet<_> = reservation.ports().iter().collect();
    assert_eq!(unique.len(), 4);
}

#[test]
fn test_missing_geo_dataset_returns_empty_descriptor() {
    let allocator = ResourceAllocator::new(Arc::new(LoopbackEngine::new()));

    let descriptor = allocator.load_geo_data("/data/geoip.dat", "ip-rules");

    assert_eq!(descriptor, EMPTY_GEO_DESCRIPTOR);
}

#[test]
fn test_present_geo_dataset_returns_engine_descriptor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("geosite.dat");
    fs::write(&path, b"\x0a\x02cn").unwrap();
    let allocator = ResourceAllocator::new(Arc::new(LoopbackEngine::new()));

    let descriptor = allocator.load_geo_data(&path, "site-rules");

    let parsed: serde_json::Value = serde_json::from_str(&descriptor).unwrap();
    assert_eq!(parsed["type"], "geosite");
    assert_eq!(parsed["loaded"], true);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_start_stop_cycle() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(LoopbackEngine::new());
    let translator = ConfigTranslator::new(engine.clone());
    let config = translator.links_to_config(&["trojan://pw@127.0.0.1:9443"]);
    let path = dir.path().join("config.json");
    fs::write(&path, config).unwrap();
    let mut controller = EngineController::new(engine.clone());

    controller.start(&path);
    assert_eq!(
        controller.state(),
        &EngineState::Running {
            version: LOOPBACK_VERSION.to_string()
        }
    );
    assert!(engine.is_running());

    controller.stop();
    assert_eq!(controller.state(), &EngineState::Stopped);
    assert!(!engine.is_running());

    controller.stop();
    assert_eq!(controller.state(), &EngineState::Stopped);
}

#[test]
fn test_start_with_missing_file_never_reaches_engine() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(LoopbackEngine::new());
    let mut controller = EngineController::new(engine.clone());

    controller.start(dir.path().join("config.json"));

    assert_eq!(controller.state(), &EngineState::Stopped);
    assert!(!engine.is_running());
}

#[test]
fn test_version_reported_when_idle() {
    let controller = EngineController::new(Arc::new(LoopbackEngine::new()));

    assert_eq!(controller.version(), LOOPBACK_VERSION);
}
