//! Starting and stopping the engine.
//!
//! ```text
//!            start (file ok, not rejected)
//!   Stopped ───────────────────────────────▶ Running(version)
//!      ▲                                          │
//!      └──────────────────── stop ────────────────┘
//! ```
//!
//! The raw engine calls do not protect against a second instance, so
//! starting while running goes through [`RestartPolicy`].

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::abi::{EngineAbi, EngineCall};
use crate::error::{LifecycleError, Result};
use crate::framing;
use crate::state::{EngineState, UNKNOWN_VERSION};

/// What `start` does when an instance is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Stop the running instance, then start the new one.
    #[default]
    StopThenStart,
    /// Refuse and keep the running instance.
    Reject,
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartPolicy::StopThenStart => write!(f, "stop-then-start"),
            RestartPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Owns the engine lifecycle for this process.
pub struct EngineController {
    engine: Arc<dyn EngineAbi>,
    state: EngineState,
    policy: RestartPolicy,
}

impl EngineController {
    /// Create a controller in the `Stopped` state.
    pub fn new(engine: Arc<dyn EngineAbi>) -> Self {
        Self {
            engine,
            state: EngineState::Stopped,
            policy: RestartPolicy::default(),
        }
    }

    /// Set the restart policy.
    pub fn with_policy(mut self, policy: RestartPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RestartPolicy {
        self.policy
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Engine build version, or `"unknown"`. Works in any state.
    pub fn version(&self) -> String {
        self.engine
            .version()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }

    /// Start the engine from the config at `config_path`.
    ///
    /// Failures are logged and not returned; check [`Self::state`] afterwards.
    pub fn start(&mut self, config_path: impl AsRef<Path>) {
        let config_path = config_path.as_ref();
        if let Err(e) = self.try_start(config_path) {
            warn!(path = %config_path.display(), error = %e, "Engine start failed");
        }
    }

    /// Start the engine, reporting why it did not start.
    ///
    /// The file is read before the engine is touched; an unreadable or
    /// non-JSON file leaves the engine `Stopped` without calling it.
    pub fn try_start(&mut self, config_path: impl AsRef<Path>) -> Result<&EngineState> {
        let config_path = config_path.as_ref();

        if let EngineState::Running { version } = &self.state {
            match self.policy {
                RestartPolicy::Reject => {
                    return Err(LifecycleError::AlreadyRunning {
                        version: version.clone(),
                    });
                }
                RestartPolicy::StopThenStart => {
                    info!(version = %version, "Engine already running, restarting");
                    self.stop();
                }
            }
        }

        let config = fs::read(config_path).map_err(|source| LifecycleError::ConfigUnreadable {
            path: config_path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice::<serde::de::IgnoredAny>(&config).map_err(|source| {
            LifecycleError::InvalidConfig {
                path: config_path.to_path_buf(),
                source,
            }
        })?;

        let status = self.engine.run(&framing::encode_request(&config));
        if let Some(reason) = framing::rejection_message(status.as_deref()) {
            return Err(LifecycleError::Rejected(reason));
        }
        if status.is_none() {
            debug!(call = %EngineCall::Run, "Engine returned no status");
        }

        let version = self.version();
        info!(path = %config_path.display(), version = %version, "Engine started");
        self.state = EngineState::Running { version };
        Ok(&self.state)
    }

    /// Stop the engine. Always calls the engine; safe to repeat.
    pub fn stop(&mut self) {
        let status = self.engine.stop();
        if let Some(reason) = framing::rejection_message(status.as_deref()) {
            warn!(call = %EngineCall::Stop, reason = %reason, "Engine reported a stop failure");
        }

        if self.state.is_running() {
            info!("Engine stopped");
        }
        self.state = EngineState::Stopped;
    }
}

impl Drop for EngineController {
    fn drop(&mut self) {
        if self.state.is_running() {
            self.stop();
        }
    }
}

impl fmt::Debug for EngineController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineController")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEngine;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        fs::write(&path, content).unwrap();
        path
    }

    fn versioned_engine() -> Arc<ScriptedEngine> {
        Arc::new(ScriptedEngine::new().respond(EngineCall::Version, "25.3.6"))
    }

    #[test]
    fn test_start_sends_base64_config() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, r#"{"outbounds":[]}"#);
        let engine = versioned_engine();
        let mut controller = EngineController::new(engine.clone());

        controller.start(&path);

        assert_eq!(
            controller.state(),
            &EngineState::Running {
                version: "25.3.6".to_string()
            }
        );
        let runs = engine.calls_to(EngineCall::Run);
        assert_eq!(runs.len(), 1);
        let sent = STANDARD.decode(runs[0].argument.as_deref().unwrap()).unwrap();
        assert_eq!(sent, br#"{"outbounds":[]}"#.to_vec());
    }

    #[test]
    fn test_start_missing_file_does_not_call_engine() {
        let dir = TempDir::new().unwrap();
        let engine = versioned_engine();
        let mut controller = EngineController::new(engine.clone());

        controller.start(dir.path().join("missing.json"));

        assert_eq!(controller.state(), &EngineState::Stopped);
        assert_eq!(engine.call_count(EngineCall::Run), 0);
    }

    #[test]
    fn test_try_start_reports_unreadable_and_invalid_config() {
        let dir = TempDir::new().unwrap();
        let engine = versioned_engine();
        let mut controller = EngineController::new(engine.clone());

        let err = controller.try_start(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, LifecycleError::ConfigUnreadable { .. }));

        let path = config_file(&dir, "{truncated");
        let err = controller.try_start(&path).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidConfig { .. }));

        assert_eq!(engine.call_count(EngineCall::Run), 0);
    }

    #[test]
    fn test_stop_when_stopped_is_harmless() {
        let engine = versioned_engine();
        let mut controller = EngineController::new(engine.clone());

        controller.stop();
        controller.stop();

        assert_eq!(controller.state(), &EngineState::Stopped);
        assert_eq!(engine.call_count(EngineCall::Stop), 2);
    }

    #[test]
    fn test_restart_stops_previous_instance() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "{}");
        let engine = versioned_engine();
        let mut controller = EngineController::new(engine.clone());

        controller.start(&path);
        controller.start(&path);

        assert!(controller.is_running());
        assert_eq!(engine.call_count(EngineCall::Run), 2);
        assert_eq!(engine.call_count(EngineCall::Stop), 1);
        let order: Vec<_> = engine
            .calls()
            .into_iter()
            .map(|c| c.call)
            .filter(|c| *c != EngineCall::Version)
            .collect();
        assert_eq!(order, vec![EngineCall::Run, EngineCall::Stop, EngineCall::Run]);
    }

    #[test]
    fn test_failed_restart_ends_stopped() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "{}");
        let engine = versioned_engine();
        let mut controller = EngineController::new(engine.clone());

        controller.start(&path);
        controller.start(dir.path().join("gone.json"));

        assert_eq!(controller.state(), &EngineState::Stopped);
        assert_eq!(engine.call_count(EngineCall::Stop), 1);
    }

    #[test]
    fn test_reject_policy_keeps_running_instance() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "{}");
        let engine = versioned_engine();
        let mut controller = EngineController::new(engine.clone()).with_policy(RestartPolicy::Reject);

        controller.start(&path);
        let err = controller.try_start(&path).unwrap_err();

        assert!(matches!(err, LifecycleError::AlreadyRunning { ref version } if version == "25.3.6"));
        assert!(controller.is_running());
        assert_eq!(engine.call_count(EngineCall::Run), 1);
        assert_eq!(engine.call_count(EngineCall::Stop), 0);
    }

    #[test]
    fn test_engine_rejection_leaves_stopped() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "{}");
        let rejection = framing::encode_request(r#"{"success":false,"error":"no outbound"}"#);
        let engine = Arc::new(ScriptedEngine::new().respond(EngineCall::Run, rejection));
        let mut controller = EngineController::new(engine.clone());

        let err = controller.try_start(&path).unwrap_err();

        assert!(matches!(err, LifecycleError::Rejected(ref reason) if reason == "no outbound"));
        assert_eq!(controller.state(), &EngineState::Stopped);
    }

    #[test]
    fn test_version_sentinel() {
        let engine = Arc::new(ScriptedEngine::new());
        let controller = EngineController::new(engine.clone());
        assert_eq!(controller.version(), UNKNOWN_VERSION);

        engine.set_response(EngineCall::Version, Some("  ".to_string()));
        assert_eq!(controller.version(), UNKNOWN_VERSION);

        engine.set_response(EngineCall::Version, Some("25.3.6".to_string()));
        assert_eq!(controller.version(), "25.3.6");
    }

    #[test]
    fn test_drop_stops_running_engine() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "{}");
        let engine = versioned_engine();

        {
            let mut controller = EngineController::new(engine.clone());
            controller.start(&path);
        }

        assert_eq!(engine.call_count(EngineCall::Stop), 1);
    }
}
