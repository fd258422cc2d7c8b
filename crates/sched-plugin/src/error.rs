use std::fmt;
use std::io;

/// Failures reported by the plugin lifecycle hooks.
#[derive(Debug)]
pub enum SchedError {
    /// `init` was called while the agent thread was still running.
    AlreadyRunning,
    /// The agent thread could not be spawned.
    Spawn(io::Error),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "scheduler agent thread already running"),
            Self::Spawn(err) => write!(f, "failed to spawn scheduler agent thread: {err}"),
        }
    }
}

impl std::error::Error for SchedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AlreadyRunning => None,
            Self::Spawn(err) => Some(err),
        }
    }
}
