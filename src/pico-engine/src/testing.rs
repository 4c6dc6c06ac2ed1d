//! A scripted in-memory engine for tests.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::abi::{EngineAbi, EngineCall};

/// One call received by a [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub call: EngineCall,
    /// The framed argument, or the port count for `free_ports`.
    pub argument: Option<String>,
}

/// Returns canned responses and records every call.
///
/// Calls without a scripted response return `None`, like a null pointer
/// from the real engine.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    responses: Mutex<HashMap<EngineCall, Option<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for `call`.
    pub fn respond(self, call: EngineCall, response: impl Into<String>) -> Self {
        self.set_response(call, Some(response.into()));
        self
    }

    /// Replace the scripted response for `call`.
    pub fn set_response(&self, call: EngineCall, response: Option<String>) {
        self.responses.lock().insert(call, response);
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls of one kind, in order.
    pub fn calls_to(&self, call: EngineCall) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.call == call)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, call: EngineCall) -> usize {
        self.calls.lock().iter().filter(|c| c.call == call).count()
    }

    fn answer(&self, call: EngineCall, argument: Option<String>) -> Option<String> {
        self.calls.lock().push(RecordedCall { call, argument });
        self.responses.lock().get(&call).cloned().flatten()
    }
}

impl EngineAbi for ScriptedEngine {
    fn run(&self, config_base64: &str) -> Option<String> {
        self.answer(EngineCall::Run, Some(config_base64.to_string()))
    }

    fn stop(&self) -> Option<String> {
        self.answer(EngineCall::Stop, None)
    }

    fn version(&self) -> Option<String> {
        self.answer(EngineCall::Version, None)
    }

    fn convert_links_to_config(&self, links_base64: &str) -> Option<String> {
        self.answer(EngineCall::LinksToConfig, Some(links_base64.to_string()))
    }

    fn convert_config_to_links(&self, config_base64: &str) -> Option<String> {
        self.answer(EngineCall::ConfigToLinks, Some(config_base64.to_string()))
    }

    fn free_ports(&self, count: u32) -> Option<String> {
        self.answer(EngineCall::FreePorts, Some(count.to_string()))
    }

    fn read_geo_files(&self, request_base64: &str) -> Option<String> {
        self.answer(EngineCall::ReadGeoFiles, Some(request_base64.to_string()))
    }
}
