//! Tracing setup for processes embedding the bridge.

use std::path::Path;

use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;
use crate::error::{BridgeError, Result};

/// Bridge log file inside the shared logs directory.
pub const BRIDGE_LOG_FILE: &str = "bridge.log";

/// Guard that flushes the bridge log file when dropped.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// Logs go to stderr and, when `config.file` is set and `logs_dir` is
/// available, to `bridge.log` in `logs_dir`. Keep the returned guard alive
/// for as long as file logging should keep flushing.
///
/// A log file that cannot be opened only drops the file output.
///
/// A subscriber that is already installed is left in place and `Ok(None)`
/// is returned.
pub fn init_tracing(config: &LoggingConfig, logs_dir: Option<&Path>) -> Result<Option<LogGuard>> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| BridgeError::Logging(format!("invalid level {:?}: {}", config.level, e)))?;

    let (json_layer, text_layer) = if config.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };

    let mut file_error = None;
    let appender = logs_dir
        .filter(|dir| config.file && dir.is_dir())
        .and_then(|dir| match file_appender(dir) {
            Ok(appender) => Some(appender),
            Err(e) => {
                file_error = Some(format!("{}: {}", dir.join(BRIDGE_LOG_FILE).display(), e));
                None
            }
        });

    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true);
            (Some(layer), Some(LogGuard { _guard: guard }))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init();

    match installed {
        Ok(()) => {
            if let Some(error) = file_error {
                warn!(error = %error, "Bridge log file unavailable, logging to stderr only");
            }
            debug!(level = %config.level, file = guard.is_some(), "Bridge logging initialized");
            Ok(guard)
        }
        Err(_) => Ok(None),
    }
}

/// `bridge.log` in `dir`, never rotated.
fn file_appender(dir: &Path) -> std::result::Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(BRIDGE_LOG_FILE)
        .build(dir)
}
