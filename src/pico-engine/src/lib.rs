//! Coordination layer over an embedded proxy engine.
//!
//! The engine does the actual forwarding. This crate starts and stops it,
//! translates share links to and from its JSON config, and asks it for free
//! local ports and routing datasets. Every call crosses a flat string ABI
//! ([`EngineAbi`]) that signals failure only by returning nothing, so the
//! public operations never fail: they fall back to a sentinel (`""`, `0`,
//! `"{}"`, `"unknown"`) and log why.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ConfigTranslator   ResourceAllocator   EngineController │
//! │        │                   │            (EngineState)    │
//! │        └──────── framing (base64 in, base64|plain out) ──┤
//! │                            │                             │
//! │                     Arc<dyn EngineAbi>                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pico_engine::{ConfigTranslator, EngineController, ResourceAllocator};
//!
//! let engine: Arc<dyn pico_engine::EngineAbi> = Arc::new(pico_libxray::LibXray::new());
//! let translator = ConfigTranslator::new(engine.clone());
//! let allocator = ResourceAllocator::new(engine.clone());
//! let mut controller = EngineController::new(engine);
//!
//! let config = translator.links_to_config(&["vless://uuid@example.com:443?security=tls"]);
//! let port = allocator.allocate_free_port();
//! controller.start("/shared/config.json");
//! println!("{} on port {}", controller.state(), port);
//! ```

pub mod abi;
pub mod allocator;
pub mod error;
pub mod framing;
pub mod lifecycle;
pub mod state;
pub mod translator;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use abi::{EngineAbi, EngineCall};
pub use allocator::{
    EMPTY_GEO_DESCRIPTOR, GeoDataKind, GeoDataRequest, NO_PORT, PortReservation,
    ResourceAllocator,
};
pub use error::{BoundaryError, LifecycleError, Result};
pub use framing::ResponseEncoding;
pub use lifecycle::{EngineController, RestartPolicy};
pub use state::{EngineState, UNKNOWN_VERSION};
pub use translator::{ConfigTranslator, ShareLink};
