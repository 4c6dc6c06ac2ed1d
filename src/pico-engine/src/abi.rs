//! The call surface of the embedded proxy engine.
//!
//! The engine is reached through a flat byte-string ABI: every argument is
//! a single string and every result is a possibly-null string. There is no
//! structured error channel, so a `None` result is the only failure signal
//! an implementation can give.

/// The seven calls the bridge makes into the engine.
///
/// String arguments are already framed by the caller (see
/// [`crate::framing`]); implementations pass them through untouched and
/// return whatever the engine produced.
pub trait EngineAbi: Send + Sync {
    /// Start the engine with a base64-encoded JSON config. Returns the raw status.
    fn run(&self, config_base64: &str) -> Option<String>;

    /// Stop the engine. Returns the raw status.
    fn stop(&self) -> Option<String>;

    /// The engine build version.
    fn version(&self) -> Option<String>;

    /// Convert base64 share-link text into a (framed) engine config.
    fn convert_links_to_config(&self, links_base64: &str) -> Option<String>;

    /// Convert a base64 engine config into (framed) share-link text.
    fn convert_config_to_links(&self, config_base64: &str) -> Option<String>;

    /// Probe `count` free local ports. Returns `{"ports":[...]}`.
    fn free_ports(&self, count: u32) -> Option<String>;

    /// Load a geo rule dataset described by a base64 `{"path","type"}` request.
    fn read_geo_files(&self, request_base64: &str) -> Option<String>;
}

/// Identifies one of the [`EngineAbi`] calls, mostly for logging and test doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineCall {
    Run,
    Stop,
    Version,
    LinksToConfig,
    ConfigToLinks,
    FreePorts,
    ReadGeoFiles,
}

impl EngineCall {
    /// Stable name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineCall::Run => "run",
            EngineCall::Stop => "stop",
            EngineCall::Version => "version",
            EngineCall::LinksToConfig => "convert_links_to_config",
            EngineCall::ConfigToLinks => "convert_config_to_links",
            EngineCall::FreePorts => "free_ports",
            EngineCall::ReadGeoFiles => "read_geo_files",
        }
    }
}

impl std::fmt::Display for EngineCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
