//! Error types for pico-engine.

use std::path::PathBuf;
use thiserror::Error;

/// Why an engine response could not be turned into a usable value.
///
/// These never reach callers of the public operations: they are logged and
/// replaced by the operation's sentinel value.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The engine returned a null or empty result.
    #[error("engine returned no response")]
    NoResponse,

    /// The response was expected to be base64 and is not.
    #[error("invalid base64 in engine response: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The decoded response is not UTF-8 text.
    #[error("engine response is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The response is not the JSON shape the call promises.
    #[error("malformed JSON in engine response: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The port probe answered with no usable ports.
    #[error("engine returned an empty port list")]
    EmptyPortList,
}

/// Errors from [`crate::EngineController::try_start`].
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The config file could not be read.
    #[error("failed to read engine config {path}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not a JSON document.
    #[error("engine config {path} is not valid JSON: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An instance is already running and the restart policy forbids replacing it.
    #[error("engine already running (version {version})")]
    AlreadyRunning { version: String },

    /// The engine reported that it did not accept the config.
    #[error("engine rejected the config: {0}")]
    Rejected(String),
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;
