//! Error types for pico-bridge.

use thiserror::Error;

use pico_engine::LifecycleError;
use pico_storage::StorageError;

/// Bridge error types.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Shared storage error. Root resolution failures land here and are fatal.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error reading bridge configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bridge configuration is not valid TOML.
    #[error("Invalid bridge config: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON error while editing the engine config.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine produced no config for the given links.
    #[error("Engine could not translate the share links")]
    TranslationFailed,

    /// The translated config is not a JSON object.
    #[error("Engine config is not a JSON object")]
    NotAnObject,

    /// No free local port was available for the inbound listener.
    #[error("No free local port available")]
    NoFreePort,

    /// Engine lifecycle error.
    #[error("Engine error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Tracing could not be set up.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
