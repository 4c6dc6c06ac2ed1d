//! Process-local engine state.

use std::fmt;

/// Version reported when the engine gives none.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Whether this process's engine instance is running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Stopped,
    Running {
        /// Engine version captured at start.
        version: String,
    },
}

impl EngineState {
    pub fn is_running(&self) -> bool {
        matches!(self, EngineState::Running { .. })
    }

    /// Version of the running instance.
    pub fn version(&self) -> Option<&str> {
        match self {
            EngineState::Running { version } => Some(version),
            EngineState::Stopped => None,
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Stopped => write!(f, "stopped"),
            EngineState::Running { version } => write!(f, "running ({})", version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_state() {
        let state = EngineState::default();
        assert!(!state.is_running());
        assert_eq!(state.version(), None);
        assert_eq!(state.to_string(), "stopped");

        let state = EngineState::Running {
            version: "25.1.1".to_string(),
        };
        assert!(state.is_running());
        assert_eq!(state.version(), Some("25.1.1"));
        assert_eq!(state.to_string(), "running (25.1.1)");
    }
}
