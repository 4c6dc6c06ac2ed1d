//! [`EngineAbi`] over the linked libXray library.

use pico_engine::EngineAbi;

use crate::ffi::{call_count, call_nullary, call_text};
use crate::sys;

/// Handle on the process-wide libXray instance.
///
/// libXray keeps a single global engine, so every handle drives the same
/// instance; keep one `EngineController` per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibXray {
    _private: (),
}

impl LibXray {
    pub fn new() -> Self {
        Self::default()
    }
}

// SAFETY (all calls below): the libXray exports copy their argument before
// returning and hand back a `C.CString` (malloc) or null.
impl EngineAbi for LibXray {
    fn run(&self, config_base64: &str) -> Option<String> {
        unsafe { call_text(sys::CGoRunXray, config_base64) }
    }

    fn stop(&self) -> Option<String> {
        unsafe { call_nullary(sys::CGoStopXray) }
    }

    fn version(&self) -> Option<String> {
        unsafe { call_nullary(sys::CGoXrayVersion) }
    }

    fn convert_links_to_config(&self, links_base64: &str) -> Option<String> {
        unsafe { call_text(sys::CGoConvertShareLinksToXrayJson, links_base64) }
    }

    fn convert_config_to_links(&self, config_base64: &str) -> Option<String> {
        unsafe { call_text(sys::CGOConvertXrayJsonToShareLinks, config_base64) }
    }

    fn free_ports(&self, count: u32) -> Option<String> {
        unsafe { call_count(sys::CGoGetFreePorts, count) }
    }

    fn read_geo_files(&self, request_base64: &str) -> Option<String> {
        unsafe { call_text(sys::CGoReadGeoFiles, request_base64) }
    }
}
