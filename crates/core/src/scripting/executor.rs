//! Process-level types shared by [`subprocess`](super::subprocess) and the
//! harness.
//!
//! These describe what happened to the host *process*. Whether the script
//! inside it succeeded is decided from the envelope's output file.

use std::time::Duration;

/// Settings for one host invocation.
#[derive(Debug, Clone)]
pub struct ScriptInput {
    /// Extra environment for the child, applied on top of the inherited one.
    pub env_vars: Vec<(String, String)>,
    /// Wall-clock limit, after which the child is killed.
    pub timeout: Duration,
}

impl ScriptInput {
    /// Inherit our environment, kill after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            env_vars: Vec::new(),
            timeout,
        }
    }

    /// Add one environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }
}

/// Streams and status of a host process that exited on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
    /// `-1` when the process was ended by a signal.
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Why a host process produced no [`ScriptOutput`].
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Still running at the deadline; the process was killed.
    #[error("Process timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Spawning or waiting failed, e.g. the executable does not exist.
    #[error("{0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
