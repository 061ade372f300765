use std::path::PathBuf;
use std::time::Duration;

use bsm_core::scripting::harness::{BlenderHarness, DEFAULT_TIMEOUT};

/// Default repository root, relative to the working directory.
pub const DEFAULT_SCRIPTS_DIR: &str = "./script_files";

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Script manager configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Repository root holding scripts, results, and the metadata index.
    pub scripts_dir: PathBuf,
    /// Explicit host executable. `None` means try the usual install paths.
    pub blender_path: Option<PathBuf>,
    /// Wall-clock limit for one host invocation (default: 60 s).
    pub execution_timeout: Duration,
    /// Directory for per-execution scratch files.
    pub scratch_dir: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
            blender_path: None,
            execution_timeout: DEFAULT_TIMEOUT,
            scratch_dir: BlenderHarness::default_scratch_dir(),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `SCRIPTS_DIR`            | `./script_files`         |
    /// | `BLENDER_PATH`           | try install locations    |
    /// | `EXECUTION_TIMEOUT_SECS` | `60`                     |
    /// | `SCRATCH_DIR`            | `<os temp>/blender_mcp`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let scripts_dir = non_empty("SCRIPTS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.scripts_dir);

        let blender_path = non_empty("BLENDER_PATH").map(PathBuf::from);

        let execution_timeout = match non_empty("EXECUTION_TIMEOUT_SECS") {
            Some(raw) => parse_timeout_secs(&raw)?,
            None => defaults.execution_timeout,
        };

        let scratch_dir = non_empty("SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.scratch_dir);

        Ok(Self {
            scripts_dir,
            blender_path,
            execution_timeout,
            scratch_dir,
        })
    }
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError {
            var: "EXECUTION_TIMEOUT_SECS",
            value: raw.to_string(),
            expected: "a positive number of seconds",
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
