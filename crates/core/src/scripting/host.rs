//! Host executable discovery.
//!
//! The host is resolved once at startup. An explicitly configured path is
//! used as-is; otherwise [`CANDIDATE_PATHS`] are tried in order by running
//! `<candidate> --version`, and the first one that runs to completion wins.
//! When nothing answers, [`DEFAULT_HOST`] is returned and left to the
//! search path.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Program name used when no candidate can be confirmed.
pub const DEFAULT_HOST: &str = "blender";

/// Common install locations, tried in order.
pub const CANDIDATE_PATHS: &[&str] = &[
    "blender",
    "/usr/bin/blender",
    "/usr/local/bin/blender",
    "/Applications/Blender.app/Contents/MacOS/Blender",
    "C:\\Program Files\\Blender Foundation\\Blender\\blender.exe",
];

/// Timeout for a single `--version` check.
pub const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// A resolved host executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostExecutable {
    path: PathBuf,
}

/// Result of checking whether the host is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStatus {
    pub installed: bool,
    /// The trimmed `--version` output, or a human-readable failure message.
    pub detail: String,
}

impl HostExecutable {
    /// Use `path` without probing.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the host: `configured` if given, else the first responsive
    /// candidate path, else [`DEFAULT_HOST`].
    pub async fn resolve(configured: Option<PathBuf>) -> Self {
        if let Some(path) = configured {
            tracing::info!(host = %path.display(), "Using configured host executable");
            return Self::from_path(path);
        }

        for candidate in CANDIDATE_PATHS {
            if version_of(Path::new(candidate)).await.is_some() {
                tracing::info!(host = candidate, "Found host executable");
                return Self::from_path(candidate);
            }
        }

        tracing::warn!(
            host = DEFAULT_HOST,
            "No host executable answered --version; relying on search path",
        );
        Self::from_path(DEFAULT_HOST)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check that the host runs and report its version.
    pub async fn verify_installation(&self) -> HostStatus {
        match version_of(&self.path).await {
            Some(stdout) => HostStatus {
                installed: true,
                detail: stdout.trim().to_string(),
            },
            None => HostStatus {
                installed: false,
                detail: format!(
                    "Host executable not found at '{}'. Install it or set BLENDER_PATH.",
                    self.path.display()
                ),
            },
        }
    }
}

/// Run `<program> --version`. Returns its stdout when the process could be
/// spawned and finished within [`VERSION_CHECK_TIMEOUT`]; the exit code is not checked.
async fn version_of(program: &Path) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.arg("--version").stdin(Stdio::null()).kill_on_drop(true);

    match tokio::time::timeout(VERSION_CHECK_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        Ok(Err(e)) => {
            tracing::debug!(host = %program.display(), error = %e, "Host version check failed");
            None
        }
        Err(_) => {
            tracing::debug!(host = %program.display(), "Host version check timed out");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    fn write_stub(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-host");
        std::fs::write(&path, format!("#!/bin/bash\n{body}")).expect("write stub");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod stub");
        path
    }

    #[tokio::test]
    async fn configured_path_wins_without_probing() {
        let host = HostExecutable::resolve(Some(PathBuf::from("/opt/custom/blender"))).await;
        assert_eq!(host.path(), Path::new("/opt/custom/blender"));
    }

    #[tokio::test]
    async fn verify_reports_version_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stub = write_stub(dir.path(), "echo 'Blender 4.1.0'\n");
        let status = HostExecutable::from_path(stub).verify_installation().await;
        assert!(status.installed);
        assert_eq!(status.detail, "Blender 4.1.0");
    }

    #[tokio::test]
    async fn verify_reports_missing_host() {
        let status = HostExecutable::from_path("/nonexistent/blender")
            .verify_installation()
            .await;
        assert!(!status.installed);
        assert!(status.detail.contains("/nonexistent/blender"));
    }

    #[test]
    fn candidate_list_starts_with_search_path_name() {
        assert_eq!(CANDIDATE_PATHS[0], DEFAULT_HOST);
    }
}
